//! Compiled pattern catalog. Every regex runs over the digit-transliterated copy of a
//! pass, so only ASCII digits need matching.

use once_cell::sync::Lazy;
use regex::Regex;

/// `dd-ddd-dddddd` with tolerant separators, or 11 contiguous digits.
pub static LICENSE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{2})\s*[-./–]?\s*(\d{3})\s*[-./–]?\s*(\d{6})\b")
        .expect("License number regex pattern is valid and should compile")
});

pub static LICENSE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bD\.?\s*L\.?\s*(?:No|Number)\b\.?|\bLicen[cs]e\s*(?:No|Number)\b\.?|\bDL\b|अनुमतिपत्र\s*नं\.?|लाइसेन्स\s*नं\.?)")
        .expect("License label regex pattern is valid and should compile")
});

pub static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b").expect("ISO date regex pattern is valid and should compile")
});

pub static DMY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b").expect("DMY date regex pattern is valid and should compile")
});

pub static NAMED_MONTH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})[\s\-]+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[\s\-,]+(\d{4}|\d{2})\b")
        .expect("Named month date regex pattern is valid and should compile")
});

pub static ISSUE_DATE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bD\.?\s*O\.?\s*I\b\.?|\bDate\s*of\s*Issue\b|\bIssue[d]?\s*(?:Date|On)\b|जारी\s*मिति)")
        .expect("Issue date label regex pattern is valid and should compile")
});

pub static EXPIRY_DATE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bD\.?\s*O\.?\s*E\b\.?|\bDate\s*of\s*Expiry\b|\bExpiry\s*Date\b|\bExpires?\b|\bValid\s*(?:Till|Until|Upto|Up\s*to)\b|बहाल\s*रहने\s*मिति|म्याद\s*सकिने\s*मिति)")
        .expect("Expiry date label regex pattern is valid and should compile")
});

pub static BIRTH_DATE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bD\.?\s*O\.?\s*B\b\.?|\bDate\s*of\s*Birth\b|\bBirth\s*Date\b|जन्म\s*मिति)")
        .expect("Birth date label regex pattern is valid and should compile")
});

/// Holder name. Anchored at line start so `F/H Name` lines never match.
pub static HOLDER_NAME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:Name|Full\s*Name|Holder'?s?\s*Name|नाम\s*थर|नाम)\s*[:.\-]?\s*(.*)$")
        .expect("Holder name regex pattern is valid and should compile")
});

pub static GUARDIAN_NAME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:F\s*/\s*H\s*(?:'?s)?\s*Name|Father\s*/\s*Husband'?s?\s*Name|Father'?s?\s*Name|Husband'?s?\s*Name|बाबु\s*/\s*पतिको\s*नाम(?:\s*थर)?|बाबुको\s*नाम(?:\s*थर)?|पतिको\s*नाम(?:\s*थर)?)\s*[:.\-]?\s*(.*)$")
        .expect("Guardian name regex pattern is valid and should compile")
});

pub static ADDRESS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:Address|Addr\.?|ठेगाना)\s*[:.\-]?\s*(.*)$").expect("Address regex pattern is valid and should compile")
});

pub static CITIZENSHIP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bCitizenship\s*(?:Cert(?:ificate)?\.?\s*)?(?:No|Number)\b\.?|\bCTZ\s*No\b\.?|\bC\.?\s*No\b\.?|ना\.?\s*प्र\.?\s*(?:प\.?\s*)?नं\.?|नागरिकता\s*(?:प्रमाणपत्र\s*)?नं\.?)\s*[:.\-]?\s*(\d[\d\s\-/]{2,22}\d)")
        .expect("Citizenship regex pattern is valid and should compile")
});

/// A run of digits that may be a phone number, with an optional `+977` prefix.
pub static PHONE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\b\d[\d\s\-]{8,16}\d\b").expect("Phone run regex pattern is valid and should compile")
});

pub static PHONE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bPhone\b|\bMobile\b|\bMob\b\.?|\bContact\b|\bCell\b|\bTel\b\.?|फोन|मोबाइल|सम्पर्क)")
        .expect("Phone label regex pattern is valid and should compile")
});

pub static MOBILE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^9[678]\d{8}$").expect("Mobile number regex pattern is valid and should compile"));

pub static BLOOD_GROUP_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bB\.?\s*G\b\.?|\bBlood\s*(?:Group|Grp|Type)\b|रक्त\s*समूह)\s*[:.\-]?\s*")
        .expect("Blood group label regex pattern is valid and should compile")
});

/// Blood group after Devanagari letters have been latinized. `0` stands in for `O`.
pub static BLOOD_GROUP_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(AB|A|B|O|0)\s*(\+\s*(?:ve)?|-\s*(?:ve)?|\(\s*[+-]\s*\)|pos(?:itive)?\b|neg(?:ative)?\b|पोजेटिभ|पोजिटिभ|नेगेटिभ)")
        .expect("Blood group value regex pattern is valid and should compile")
});

pub static CATEGORY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bCategory\b|\bCat\b\.?|\bClass\b|वर्ग|श्रेणी)\s*[:.\-]?\s*(.+)$")
        .expect("Category regex pattern is valid and should compile")
});

pub static AUTHORITY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:Issued\s*By|Issuing\s*(?:Authority|Office)|Office|जारी\s*गर्ने\s*(?:कार्यालय|निकाय)|कार्यालय)\s*[:.\-]?\s*(.*)$")
        .expect("Authority regex pattern is valid and should compile")
});

/// Lines naming a transport office without a label.
pub static TRANSPORT_OFFICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Transport\s*Management\s*(?:Service\s*)?Office|Department\s*of\s*Transport\s*Management|यातायात\s*व्यवस्था\s*(?:सेवा\s*)?(?:कार्यालय|विभाग))")
        .expect("Transport office regex pattern is valid and should compile")
});

/// Collapses runs of whitespace to single spaces and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
