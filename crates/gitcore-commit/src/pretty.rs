//! Pretty-printing commits into the classic presentation formats.
//!
//! The renderer works directly on the raw commit bytes (retained on the node
//! or re-read from the source), so it reproduces header text byte-for-byte:
//! `raw` copies headers verbatim, the other formats re-render author and
//! committer lines, fold multiple parents into a `Merge:` line, RFC
//! 2047-quote mail headers, and re-encode the log body between charsets.

use bstr::{BString, ByteSlice};
use gitcore_date::{Date, DateStyle};
use gitcore_hash::Oid;

use crate::interp::format_commit_message;
use crate::store::{CommitId, CommitStore, ObjectSource};
use crate::GraphError;

/// The presentation format catalogue. `UserFormat` carries the `%`-token
/// template captured from a `format:` selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PrettyFormat {
    Raw,
    #[default]
    Medium,
    Short,
    Email,
    Full,
    Fuller,
    Oneline,
    UserFormat(String),
}

impl PrettyFormat {
    /// Parse a `--pretty` selector. Prefixes are accepted down to a
    /// per-name minimum length (`full` and `fuller` require five
    /// characters, everything else one); a leading `=` is tolerated;
    /// `format:REST` captures `REST` as the user template. An empty
    /// selector means the default format.
    pub fn parse(arg: &str) -> Result<Self, GraphError> {
        if arg.is_empty() {
            return Ok(Self::default());
        }
        let arg = arg.strip_prefix('=').unwrap_or(arg);
        if let Some(template) = arg.strip_prefix("format:") {
            return Ok(Self::UserFormat(template.to_string()));
        }
        const TABLE: [(&str, usize); 7] = [
            ("raw", 1),
            ("medium", 1),
            ("short", 1),
            ("email", 1),
            ("full", 5),
            ("fuller", 5),
            ("oneline", 1),
        ];
        for (name, min_len) in TABLE {
            if name.starts_with(arg) && arg.len() >= min_len.min(name.len()) {
                return Ok(match name {
                    "raw" => Self::Raw,
                    "medium" => Self::Medium,
                    "short" => Self::Short,
                    "email" => Self::Email,
                    "full" => Self::Full,
                    "fuller" => Self::Fuller,
                    _ => Self::Oneline,
                });
            }
        }
        Err(GraphError::BadFormat(arg.to_string()))
    }
}

/// Formatter configuration.
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    pub format: PrettyFormat,
    /// Hash abbreviation width for `Merge:` lines; 0 renders full hashes.
    pub abbrev: usize,
    /// Prefix emitted before the title line (email subjects).
    pub subject: Option<String>,
    /// Extra header block emitted after the title line.
    pub after_subject: Option<String>,
    pub date_style: DateStyle,
    /// Output-encoding preferences; the first non-empty wins, `utf-8`
    /// otherwise.
    pub log_output_encoding: Option<String>,
    pub commit_encoding: Option<String>,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            format: PrettyFormat::default(),
            abbrev: 7,
            subject: None,
            after_subject: None,
            date_style: DateStyle::Default,
            log_output_encoding: None,
            commit_encoding: None,
        }
    }
}

impl PrettyOptions {
    /// The encoding commit text is rendered in.
    pub fn output_encoding(&self) -> &str {
        [&self.log_output_encoding, &self.commit_encoding]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|enc| !enc.is_empty())
            .unwrap_or("utf-8")
    }
}

/// Render a commit in the configured format.
pub fn pretty_print_commit<S: ObjectSource>(
    store: &mut CommitStore<S>,
    id: CommitId,
    opts: &PrettyOptions,
) -> Result<BString, GraphError> {
    if let PrettyFormat::UserFormat(template) = &opts.format {
        return format_commit_message(store, id, template);
    }

    store.parse_commit(id)?;
    let raw = store.commit_bytes(id)?;
    let oid = store.node(id).oid();
    let encoding = opts.output_encoding().to_string();
    let msg: Vec<u8> = match logmsg_reencode(oid, &raw, &encoding)? {
        Some(reencoded) => reencoded.into(),
        None => raw.into(),
    };

    let fmt = &opts.format;
    let oneline = matches!(fmt, PrettyFormat::Oneline);
    let email = matches!(fmt, PrettyFormat::Email);
    let indent = if oneline || email { 0 } else { 4 };

    // A non-ASCII body in a plain email needs the MIME charset headers; a
    // caller-supplied after_subject block is assumed to bring its own.
    let mut plain_non_ascii = false;
    if email && opts.after_subject.is_none() {
        let mut in_body = false;
        let mut i = 0;
        while i < msg.len() {
            let ch = msg[i];
            if !in_body {
                if ch == b'\n' && msg.get(i + 1) == Some(&b'\n') {
                    in_body = true;
                }
            } else if non_ascii(ch) {
                plain_non_ascii = true;
                break;
            }
            i += 1;
        }
    }

    let mut out: Vec<u8> = Vec::new();
    let mut pos = 0usize;

    pp_header(
        store,
        id,
        fmt,
        opts.abbrev,
        opts.date_style,
        &encoding,
        &msg,
        &mut pos,
        &mut out,
    )?;
    if !oneline && opts.subject.is_none() {
        out.push(b'\n');
    }

    // Skip excess blank lines at the beginning of the body.
    loop {
        let linelen = get_one_line(&msg[pos..]);
        if linelen == 0 {
            break;
        }
        if trimmed_len(&msg[pos..pos + linelen]) != 0 {
            break;
        }
        pos += linelen;
    }

    // These formats treat the title line specially.
    if oneline || email {
        pp_title_line(
            fmt,
            &msg,
            &mut pos,
            &mut out,
            opts.subject.as_deref(),
            opts.after_subject.as_deref(),
            &encoding,
            plain_non_ascii,
        );
    }

    let beginning_of_body = out.len();
    if !oneline {
        pp_remainder(fmt, &msg, &mut pos, &mut out, indent);
    }
    while out.last().is_some_and(|b| b.is_ascii_whitespace()) {
        out.pop();
    }
    if !oneline {
        out.push(b'\n');
    }
    // Callers may append body text to an email; keep the blank line between
    // header and body even when the body is empty.
    if email && out.len() <= beginning_of_body {
        out.push(b'\n');
    }
    Ok(BString::from(out))
}

/// Length of the first line of `msg`, counting its newline; 0 at the end.
fn get_one_line(msg: &[u8]) -> usize {
    match msg.iter().position(|&b| b == b'\n') {
        Some(at) => at + 1,
        None => msg.len(),
    }
}

/// High bit set, or the ISO-2022 escape.
fn non_ascii(b: u8) -> bool {
    b & 0x80 != 0 || b == 0x1b
}

fn is_rfc2047_special(b: u8) -> bool {
    non_ascii(b) || b == b'=' || b == b'?' || b == b'_'
}

/// Line length with trailing whitespace stripped.
fn trimmed_len(line: &[u8]) -> usize {
    let mut len = line.len();
    while len > 0 && line[len - 1].is_ascii_whitespace() {
        len -= 1;
    }
    len
}

/// Append `line`, RFC 2047 Q-quoted when it needs it. Spaces are encoded as
/// `=20`: many consumers never learned the `_` shorthand.
fn add_rfc2047(out: &mut Vec<u8>, line: &[u8], encoding: &str) {
    let needs_quote = line
        .iter()
        .enumerate()
        .any(|(i, &b)| non_ascii(b) || (b == b'=' && line.get(i + 1) == Some(&b'?')));
    if !needs_quote {
        out.extend_from_slice(line);
        return;
    }
    out.extend_from_slice(format!("=?{encoding}?q?").as_bytes());
    for &b in line {
        if is_rfc2047_special(b) || b == b' ' {
            out.extend_from_slice(format!("={b:02X}").as_bytes());
        } else {
            out.push(b);
        }
    }
    out.extend_from_slice(b"?=");
}

/// Skip leading whitespace, then read a decimal number; saturates instead of
/// overflowing. Returns the value and the bytes consumed.
pub(crate) fn scan_decimal(bytes: &[u8]) -> (u64, usize) {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let mut value: u64 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(u64::from(bytes[i] - b'0'));
        i += 1;
    }
    (value, i)
}

/// Like [`scan_decimal`] but with an optional sign, for timezone suffixes.
fn scan_signed_decimal(bytes: &[u8]) -> i32 {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let mut sign = 1i64;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        if bytes[i] == b'-' {
            sign = -1;
        }
        i += 1;
    }
    let mut value = 0i64;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(bytes[i] - b'0'));
        i += 1;
    }
    (sign * value).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Emit one `Author:` / `Commit:` / `From:` header from the identity text
/// after the key, plus the per-format `Date:` line. `line` carries
/// `Name <email> seconds tz` without the trailing newline; a line with no
/// `>` terminator is skipped entirely.
fn add_user_info(
    what: &str,
    fmt: &PrettyFormat,
    out: &mut Vec<u8>,
    line: &[u8],
    date_style: DateStyle,
    encoding: &str,
) {
    if matches!(fmt, PrettyFormat::Oneline) {
        return;
    }
    let Some(gt) = line.iter().position(|&b| b == b'>') else {
        return;
    };
    let namelen = gt + 1;
    let (seconds, used) = scan_decimal(&line[namelen..]);
    let tz = scan_signed_decimal(&line[namelen + used..]);
    let date = Date::from_decimal_offset(
        i64::try_from(seconds).unwrap_or(i64::MAX),
        tz,
    );

    if matches!(fmt, PrettyFormat::Email) {
        let Some(lt) = line.iter().position(|&b| b == b'<') else {
            return;
        };
        let mut name_end = lt;
        while name_end > 0 && line[name_end - 1].is_ascii_whitespace() {
            name_end -= 1;
        }
        out.extend_from_slice(b"From: ");
        add_rfc2047(out, &line[..name_end], encoding);
        out.extend_from_slice(&line[name_end..namelen]);
        out.push(b'\n');
    } else {
        out.extend_from_slice(what.as_bytes());
        out.extend_from_slice(b": ");
        if matches!(fmt, PrettyFormat::Fuller) {
            out.extend_from_slice(b"    ");
        }
        out.extend_from_slice(&line[..namelen]);
        out.push(b'\n');
    }

    match fmt {
        PrettyFormat::Medium => {
            out.extend_from_slice(b"Date:   ");
            out.extend_from_slice(date.format(date_style).as_bytes());
            out.push(b'\n');
        }
        PrettyFormat::Email => {
            out.extend_from_slice(b"Date: ");
            out.extend_from_slice(date.format(DateStyle::Rfc2822).as_bytes());
            out.push(b'\n');
        }
        PrettyFormat::Fuller => {
            out.extend_from_slice(what.as_bytes());
            out.extend_from_slice(b"Date: ");
            out.extend_from_slice(date.format(date_style).as_bytes());
            out.push(b'\n');
        }
        _ => {}
    }
}

/// One `Merge: <hex> <hex>...` line for commits with at least two parents.
fn add_merge_info<S: ObjectSource>(
    fmt: &PrettyFormat,
    out: &mut Vec<u8>,
    store: &CommitStore<S>,
    id: CommitId,
    abbrev: usize,
) {
    if matches!(fmt, PrettyFormat::Oneline | PrettyFormat::Email) {
        return;
    }
    let parents = store.node(id).parents();
    if parents.len() < 2 {
        return;
    }
    out.extend_from_slice(b"Merge:");
    for &parent in parents {
        let hex = store.node(parent).oid().to_hex();
        out.push(b' ');
        if abbrev > 0 && abbrev < hex.len() {
            out.extend_from_slice(&hex.as_bytes()[..abbrev]);
            out.extend_from_slice(b"...");
        } else {
            out.extend_from_slice(hex.as_bytes());
        }
    }
    out.push(b'\n');
}

/// Iterate header lines up to the blank terminator: verbatim for `raw`,
/// otherwise validating and suppressing `parent` lines, emitting the
/// `Merge:` info once, and rendering author/committer via
/// [`add_user_info`].
#[allow(clippy::too_many_arguments)]
fn pp_header<S: ObjectSource>(
    store: &CommitStore<S>,
    id: CommitId,
    fmt: &PrettyFormat,
    abbrev: usize,
    date_style: DateStyle,
    encoding: &str,
    msg: &[u8],
    pos: &mut usize,
    out: &mut Vec<u8>,
) -> Result<(), GraphError> {
    let hex_len = store.node(id).oid().kind().hex_len();
    let mut parents_shown = false;
    loop {
        let rest = &msg[*pos..];
        let linelen = get_one_line(rest);
        if linelen == 0 {
            return Ok(());
        }
        let line = &rest[..linelen];
        *pos += linelen;
        if linelen == 1 {
            // End of header.
            return Ok(());
        }

        if matches!(fmt, PrettyFormat::Raw) {
            out.extend_from_slice(line);
            continue;
        }

        if line.starts_with(b"parent ") {
            if linelen != hex_len + 8 {
                return Err(GraphError::BadCommit {
                    oid: store.node(id).oid(),
                    reason: "bad parent line",
                });
            }
            continue;
        }

        if !parents_shown {
            add_merge_info(fmt, out, store, id, abbrev);
            parents_shown = true;
        }

        let content_end = if line.last() == Some(&b'\n') {
            linelen - 1
        } else {
            linelen
        };
        if line.starts_with(b"author ") {
            add_user_info("Author", fmt, out, &line[7..content_end], date_style, encoding);
        }
        if line.starts_with(b"committer ")
            && matches!(fmt, PrettyFormat::Full | PrettyFormat::Fuller)
        {
            add_user_info("Commit", fmt, out, &line[10..content_end], date_style, encoding);
        }
    }
}

/// Collect the title: non-empty lines joined by `" "` (`"\n "` in email)
/// until the first empty line, then emit it with the optional subject
/// prefix, RFC 2047 quoting, MIME block and after-subject text.
#[allow(clippy::too_many_arguments)]
fn pp_title_line(
    fmt: &PrettyFormat,
    msg: &[u8],
    pos: &mut usize,
    out: &mut Vec<u8>,
    subject: Option<&str>,
    after_subject: Option<&str>,
    encoding: &str,
    plain_non_ascii: bool,
) {
    let email = matches!(fmt, PrettyFormat::Email);
    let mut title: Vec<u8> = Vec::new();
    loop {
        let rest = &msg[*pos..];
        let linelen = get_one_line(rest);
        let line = &rest[..linelen];
        *pos += linelen;
        let content = trimmed_len(line);
        if linelen == 0 || content == 0 {
            break;
        }
        if !title.is_empty() {
            if email {
                title.push(b'\n');
            }
            title.push(b' ');
        }
        title.extend_from_slice(&line[..content]);
    }

    if let Some(subject) = subject {
        out.extend_from_slice(subject.as_bytes());
        add_rfc2047(out, &title, encoding);
    } else {
        out.extend_from_slice(&title);
    }
    out.push(b'\n');

    if plain_non_ascii {
        out.extend_from_slice(b"MIME-Version: 1.0\n");
        out.extend_from_slice(
            format!("Content-Type: text/plain; charset={encoding}\n").as_bytes(),
        );
        out.extend_from_slice(b"Content-Transfer-Encoding: 8bit\n");
    }
    if let Some(after) = after_subject {
        out.extend_from_slice(after.as_bytes());
    }
    if email {
        out.push(b'\n');
    }
}

/// Emit the remaining body lines, right-trimmed, with the format's indent.
/// `short` stops at the first paragraph break.
fn pp_remainder(fmt: &PrettyFormat, msg: &[u8], pos: &mut usize, out: &mut Vec<u8>, indent: usize) {
    let mut first = true;
    loop {
        let rest = &msg[*pos..];
        let linelen = get_one_line(rest);
        if linelen == 0 {
            break;
        }
        let line = &rest[..linelen];
        *pos += linelen;

        let content = trimmed_len(line);
        if content == 0 {
            if first {
                continue;
            }
            if matches!(fmt, PrettyFormat::Short) {
                break;
            }
        }
        first = false;

        if indent > 0 {
            out.resize(out.len() + indent, b' ');
        }
        out.extend_from_slice(&line[..content]);
        out.push(b'\n');
    }
}

/// The value of the first `key value` header line, scanning until the blank
/// header terminator.
fn get_header(buffer: &[u8], key: &[u8]) -> Option<BString> {
    let mut rest = buffer;
    loop {
        if rest.is_empty() {
            return None;
        }
        let eol = rest.iter().position(|&b| b == b'\n');
        let line = match eol {
            Some(at) => &rest[..at],
            None => rest,
        };
        if line.is_empty() {
            return None;
        }
        if line.len() > key.len() && &line[..key.len()] == key && line[key.len()] == b' ' {
            return Some(BString::from(&line[key.len() + 1..]));
        }
        match eol {
            Some(at) => rest = &rest[at + 1..],
            None => return None,
        }
    }
}

fn is_encoding_utf8(name: &str) -> bool {
    name.eq_ignore_ascii_case("utf-8") || name.eq_ignore_ascii_case("utf8")
}

/// Transcode a commit buffer to `output_encoding`.
///
/// Returns `Ok(None)` when the original buffer is already right (no
/// `encoding` header and a matching declared encoding) or when either
/// charset is unknown; otherwise the transcoded buffer with its `encoding`
/// header rewritten, or removed when the target is UTF-8.
pub fn logmsg_reencode(
    oid: Oid,
    buffer: &[u8],
    output_encoding: &str,
) -> Result<Option<BString>, GraphError> {
    if output_encoding.is_empty() {
        return Ok(None);
    }
    let header = get_header(buffer, b"encoding");
    let declared = header
        .as_ref()
        .map(|enc| String::from_utf8_lossy(enc).into_owned());
    let use_encoding = declared.as_deref().unwrap_or("utf-8");

    let out: Vec<u8> = if use_encoding == output_encoding {
        if header.is_none() {
            return Ok(None);
        }
        // Same encoding, but the header still wants stripping or rewriting.
        buffer.to_vec()
    } else {
        match reencode_bytes(buffer, output_encoding, use_encoding) {
            Some(out) => out,
            None => return Ok(None),
        }
    };

    replace_encoding_header(oid, out, output_encoding).map(|buf| Some(BString::from(buf)))
}

/// Best-effort charset translation; `None` when a label is unknown.
fn reencode_bytes(input: &[u8], to_label: &str, from_label: &str) -> Option<Vec<u8>> {
    let from = encoding_rs::Encoding::for_label(from_label.as_bytes())?;
    let to = encoding_rs::Encoding::for_label(to_label.as_bytes())?;
    let (text, _, _) = from.decode(input);
    let (bytes, _, _) = to.encode(&text);
    Some(bytes.into_owned())
}

/// Rewrite the `encoding` header of a transcoded buffer: drop it when the
/// new encoding is UTF-8, overwrite the value otherwise. An encoding header
/// with no terminating newline before the header/body boundary is malformed.
fn replace_encoding_header(
    oid: Oid,
    buf: Vec<u8>,
    encoding: &str,
) -> Result<Vec<u8>, GraphError> {
    let header_end = buf.find(b"\n\n").unwrap_or(buf.len());
    let Some(at) = buf.find(b"\nencoding ") else {
        return Ok(buf);
    };
    if at >= header_end {
        return Ok(buf);
    }
    let line_start = at + 1;
    let value_start = line_start + b"encoding ".len();
    let Some(nl) = buf[line_start..].find_byte(b'\n') else {
        return Err(GraphError::BadCommit {
            oid,
            reason: "unterminated encoding header",
        });
    };
    let line_end = line_start + nl + 1;

    let mut buf = buf;
    if is_encoding_utf8(encoding) {
        buf.drain(line_start..line_end);
    } else {
        buf.splice(value_start..line_end - 1, encoding.bytes());
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_exact_and_prefix() {
        assert_eq!(PrettyFormat::parse("oneline").unwrap(), PrettyFormat::Oneline);
        assert_eq!(PrettyFormat::parse("o").unwrap(), PrettyFormat::Oneline);
        assert_eq!(PrettyFormat::parse("=oneline").unwrap(), PrettyFormat::Oneline);
        assert_eq!(PrettyFormat::parse("m").unwrap(), PrettyFormat::Medium);
        assert_eq!(PrettyFormat::parse("raw").unwrap(), PrettyFormat::Raw);
        assert_eq!(PrettyFormat::parse("e").unwrap(), PrettyFormat::Email);
    }

    #[test]
    fn selector_minimum_lengths() {
        assert_eq!(PrettyFormat::parse("full").unwrap(), PrettyFormat::Full);
        assert_eq!(PrettyFormat::parse("fuller").unwrap(), PrettyFormat::Fuller);
        assert_eq!(PrettyFormat::parse("fulle").unwrap(), PrettyFormat::Fuller);
        assert!(matches!(
            PrettyFormat::parse("ful"),
            Err(GraphError::BadFormat(_))
        ));
        assert!(matches!(
            PrettyFormat::parse("f"),
            Err(GraphError::BadFormat(_))
        ));
    }

    #[test]
    fn selector_user_format() {
        let fmt = PrettyFormat::parse("format:%H %s").unwrap();
        assert_eq!(fmt, PrettyFormat::UserFormat("%H %s".to_string()));
    }

    #[test]
    fn selector_rejects_unknown() {
        assert!(matches!(
            PrettyFormat::parse("nope"),
            Err(GraphError::BadFormat(_))
        ));
        assert!(matches!(
            PrettyFormat::parse("="),
            Err(GraphError::BadFormat(_))
        ));
    }

    #[test]
    fn selector_empty_is_default() {
        assert_eq!(PrettyFormat::parse("").unwrap(), PrettyFormat::Medium);
    }

    #[test]
    fn rfc2047_ascii_passes_through() {
        let mut out = Vec::new();
        add_rfc2047(&mut out, b"Ada", "utf-8");
        assert_eq!(out, b"Ada");
    }

    #[test]
    fn rfc2047_quotes_non_ascii() {
        let mut out = Vec::new();
        add_rfc2047(&mut out, "Zoë".as_bytes(), "utf-8");
        assert_eq!(out, b"=?utf-8?q?Zo=C3=AB?=");
    }

    #[test]
    fn rfc2047_quotes_spaces_as_hex() {
        let mut out = Vec::new();
        add_rfc2047(&mut out, "à b".as_bytes(), "utf-8");
        assert_eq!(out, b"=?utf-8?q?=C3=A0=20b?=");
    }

    #[test]
    fn rfc2047_quotes_encoded_word_lookalike() {
        let mut out = Vec::new();
        add_rfc2047(&mut out, b"=?huh?=", "utf-8");
        assert_eq!(out, b"=?utf-8?q?=3D=3Fhuh=3F=3D?=");
    }

    #[test]
    fn output_encoding_preference_order() {
        let mut opts = PrettyOptions::default();
        assert_eq!(opts.output_encoding(), "utf-8");
        opts.commit_encoding = Some("ISO-8859-1".into());
        assert_eq!(opts.output_encoding(), "ISO-8859-1");
        opts.log_output_encoding = Some("utf-8".into());
        assert_eq!(opts.output_encoding(), "utf-8");
        opts.log_output_encoding = Some(String::new());
        assert_eq!(opts.output_encoding(), "ISO-8859-1");
    }

    #[test]
    fn get_header_finds_first_match_before_body() {
        let buf = b"tree t\nencoding latin1\n\nencoding body\n";
        assert_eq!(get_header(buf, b"encoding").unwrap(), "latin1");
        assert_eq!(get_header(buf, b"author"), None);
    }
}
