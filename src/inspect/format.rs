//! Text renderings of certificate fields
//!
//! Output follows what OpenSSL-based TLS front-ends have historically handed to
//! applications: multi-line short-name DNs, `Mon DD HH:MM:SS YYYY GMT` timestamps,
//! colon-separated uppercase fingerprints and bare uppercase hex big integers.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use x509_parser::der_parser::Oid;
use x509_parser::extensions::GeneralName;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::time::ASN1Time;
use x509_parser::x509::X509Name;

/// `Mon DD HH:MM:SS YYYY`, day padded with a space.
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:space] [hour]:[minute]:[second] [year]");

/// Short names OpenSSL prints where they differ from the registry abbreviations.
fn openssl_override(oid: &Oid<'_>) -> Option<&'static str> {
    match oid.to_id_string().as_str() {
        "2.5.4.4" => Some("SN"),
        "2.5.4.9" => Some("street"),
        "2.5.4.42" => Some("GN"),
        "2.5.4.65" => Some("pseudonym"),
        "2.5.4.97" => Some("organizationIdentifier"),
        "1.2.840.113549.1.9.1" => Some("emailAddress"),
        "0.9.2342.19200300.100.1.1" => Some("UID"),
        "1.3.6.1.4.1.311.60.2.1.3" => Some("jurisdictionC"),
        _ => None,
    }
}

/// Short name for a DN attribute OID, falling back to dotted-decimal.
fn attribute_short_name(oid: &Oid<'_>) -> String {
    if let Some(name) = openssl_override(oid) {
        return name.to_string();
    }
    match oid2abbrev(oid, oid_registry()) {
        Ok(name) => name.to_string(),
        Err(_) => oid.to_id_string(),
    }
}

/// Escape control characters and bytes with the high bit set as `\XX`.
fn escape_value(value: &[u8]) -> String {
    let mut out = String::with_capacity(value.len());
    for &b in value {
        if b < 0x20 || b >= 0x7f {
            out.push_str(&format!("\\{:02X}", b));
        } else {
            out.push(b as char);
        }
    }
    out
}

/// Render each attribute of a DN as `SN=value`, in certificate order.
fn name_components(name: &X509Name<'_>) -> Vec<Vec<String>> {
    name.iter()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| {
                    let value = match attr.as_str() {
                        Ok(s) => escape_value(s.as_bytes()),
                        Err(_) => format!("#{}", hex_upper(attr.attr_value().data)),
                    };
                    format!("{}={}", attribute_short_name(attr.attr_type()), value)
                })
                .collect()
        })
        .collect()
}

/// Multi-line distinguished name: one RDN per line, multi-valued RDNs joined by ` + `.
pub fn format_name(name: &X509Name<'_>) -> String {
    name_components(name)
        .into_iter()
        .map(|rdn| rdn.join(" + "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-line `/SN=value/SN=value` distinguished name.
pub fn format_name_oneline(name: &X509Name<'_>) -> String {
    name_components(name)
        .into_iter()
        .map(|rdn| format!("/{}", rdn.join("+")))
        .collect()
}

/// `Mon DD HH:MM:SS YYYY GMT`, day padded with a space.
pub fn format_time(time: &ASN1Time) -> String {
    match time.to_datetime().format(TIME_FORMAT) {
        Ok(text) => format!("{} GMT", text),
        Err(_) => time.to_string(),
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Colon-separated uppercase hex octets (`AB:CD:...`).
pub fn hex_colon(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<String>>()
        .join(":")
}

/// Unsigned big-endian integer as uppercase hex without leading zeros.
pub fn bignum_hex(bytes: &[u8]) -> String {
    let digits = hex_upper(bytes);
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// IP address octets from a subjectAltName entry.
fn format_ip(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]),
        16 => bytes
            .chunks(2)
            .map(|pair| format!("{:X}", u16::from_be_bytes([pair[0], pair[1]])))
            .collect::<Vec<_>>()
            .join(":"),
        _ => "<invalid>".to_string(),
    }
}

/// Render one general name as `TYPE:value`.
pub fn format_general_name(name: &GeneralName<'_>) -> String {
    match name {
        GeneralName::DNSName(dns) => format!("DNS:{}", dns),
        GeneralName::RFC822Name(email) => format!("email:{}", email),
        GeneralName::URI(uri) => format!("URI:{}", uri),
        GeneralName::IPAddress(ip) => format!("IP Address:{}", format_ip(ip)),
        GeneralName::DirectoryName(dn) => format!("DirName:{}", format_name_oneline(dn)),
        GeneralName::RegisteredID(oid) => format!("Registered ID:{}", oid.to_id_string()),
        GeneralName::OtherName(..) => "othername:<unsupported>".to_string(),
        GeneralName::X400Address(..) => "X400Name:<unsupported>".to_string(),
        GeneralName::EDIPartyName(..) => "EdiPartyName:<unsupported>".to_string(),
        #[allow(unreachable_patterns)]
        _ => "<unsupported>".to_string(),
    }
}

/// Comma-separated subjectAltName text.
pub fn format_general_names(names: &[GeneralName<'_>]) -> String {
    names
        .iter()
        .map(format_general_name)
        .collect::<Vec<_>>()
        .join(", ")
}
