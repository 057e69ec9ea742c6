//! User-format templating: `%`-token substitution from per-commit values.

use bstr::BString;
use gitcore_date::{Date, DateStyle};
use gitcore_hash::Oid;

use crate::store::{CommitId, CommitStore, ObjectSource};
use crate::walk::{BOUNDARY, SYMMETRIC_LEFT};
use crate::GraphError;

const DEFAULT_ABBREV: usize = 7;

/// The joined parent-hash strings live in a bounded buffer; excess parents
/// are silently truncated.
const PARENTS_CAP: usize = 1024;

/// The token catalogue, scanned first-match in this order.
const TOKENS: [&str; 29] = [
    "%H", "%h", "%T", "%t", "%P", "%p", "%an", "%ae", "%ad", "%aD", "%ar", "%at", "%ai", "%cn",
    "%ce", "%cd", "%cD", "%cr", "%ct", "%ci", "%e", "%s", "%b", "%Cred", "%Cgreen", "%Cblue",
    "%Creset", "%n", "%m",
];

const IHASH: usize = 0;
const IHASH_ABBREV: usize = 1;
const ITREE: usize = 2;
const ITREE_ABBREV: usize = 3;
const IPARENTS: usize = 4;
const IPARENTS_ABBREV: usize = 5;
const IAUTHOR_NAME: usize = 6;
const ICOMMITTER_NAME: usize = 13;
const IENCODING: usize = 20;
const ISUBJECT: usize = 21;
const IBODY: usize = 22;
const IRED: usize = 23;
const IGREEN: usize = 24;
const IBLUE: usize = 25;
const IRESET_COLOR: usize = 26;
const INEWLINE: usize = 27;
const ILEFT_RIGHT: usize = 28;

/// Render a commit through a user template. Tokens with no value for this
/// commit substitute the literal `<unknown>`; anything that is not a known
/// token is copied verbatim.
pub fn format_commit_message<S: ObjectSource>(
    store: &mut CommitStore<S>,
    id: CommitId,
    template: &str,
) -> Result<BString, GraphError> {
    store.parse_commit(id)?;
    let msg = store.commit_bytes(id)?;

    let oid = store.node(id).oid();
    let tree = store.node(id).tree();
    let flags = store.flags(id);
    let parent_oids: Vec<Oid> = store
        .node(id)
        .parents()
        .iter()
        .map(|&p| store.node(p).oid())
        .collect();

    let mut values: Vec<Option<BString>> = vec![None; TOKENS.len()];

    // Independent of the commit.
    values[IRED] = Some("\x1b[31m".into());
    values[IGREEN] = Some("\x1b[32m".into());
    values[IBLUE] = Some("\x1b[34m".into());
    values[IRESET_COLOR] = Some("\x1b[m".into());
    values[INEWLINE] = Some("\n".into());

    // Identity.
    values[IHASH] = Some(oid.to_hex().into());
    values[IHASH_ABBREV] = Some(oid.to_hex_abbrev(DEFAULT_ABBREV).into());
    if let Some(tree) = tree {
        values[ITREE] = Some(tree.to_hex().into());
        values[ITREE_ABBREV] = Some(tree.to_hex_abbrev(DEFAULT_ABBREV).into());
    }
    values[ILEFT_RIGHT] = Some(
        if flags & BOUNDARY != 0 {
            "-"
        } else if flags & SYMMETRIC_LEFT != 0 {
            "<"
        } else {
            ">"
        }
        .into(),
    );
    values[IPARENTS] = Some(joined_parents(&parent_oids, 0));
    values[IPARENTS_ABBREV] = Some(joined_parents(&parent_oids, DEFAULT_ABBREV));

    // Header, subject and body from the raw buffer.
    let msg = msg.as_slice();
    let mut state = 0u8; // header, subject, body
    let mut i = 0;
    while i < msg.len() && state < 2 {
        let mut eol = i;
        while eol < msg.len() && msg[eol] != b'\n' {
            eol += 1;
        }
        if state == 1 {
            values[ISUBJECT] = Some(BString::from(&msg[i..eol]));
            i = eol;
        }
        if i == eol {
            state += 1;
            // strip empty lines
            while eol + 1 < msg.len() && msg[eol + 1] == b'\n' {
                eol += 1;
            }
        } else if msg[i..].starts_with(b"author ") {
            fill_person(&mut values, IAUTHOR_NAME, &msg[i + 7..eol]);
        } else if msg[i..].starts_with(b"committer ") {
            fill_person(&mut values, ICOMMITTER_NAME, &msg[i + 10..eol]);
        } else if msg[i..].starts_with(b"encoding ") {
            values[IENCODING] = Some(BString::from(&msg[i + 9..eol]));
        }
        i = eol + 1;
    }
    if i < msg.len() {
        values[IBODY] = Some(BString::from(&msg[i..]));
    }

    let values: Vec<BString> = values
        .into_iter()
        .map(|value| value.unwrap_or_else(|| BString::from("<unknown>")))
        .collect();
    Ok(interpolate(template, &values))
}

/// Space-joined parent hashes, bounded by [`PARENTS_CAP`].
fn joined_parents(oids: &[Oid], abbrev: usize) -> BString {
    let mut buf: Vec<u8> = Vec::new();
    for oid in oids {
        if buf.len() >= PARENTS_CAP - 1 {
            break;
        }
        let entry = format!(" {}", oid.to_hex_abbrev(abbrev));
        let room = PARENTS_CAP - 1 - buf.len();
        let take = entry.len().min(room);
        buf.extend_from_slice(&entry.as_bytes()[..take]);
    }
    if buf.is_empty() {
        BString::from("")
    } else {
        BString::from(&buf[1..])
    }
}

/// Fill the seven per-person slots (name, email, and the date renderings)
/// from the text after an `author ` / `committer ` key. Parsing stops at the
/// first structural surprise, leaving the remaining slots unset.
fn fill_person(values: &mut [Option<BString>], base: usize, text: &[u8]) {
    let len = text.len();

    // name: up to '<', trailing whitespace trimmed
    let mut lt = 0;
    while lt < len && text[lt] != b'<' {
        lt += 1;
    }
    let email_start = lt + 1;
    let mut name_end = lt;
    while name_end > 0 && text[name_end - 1].is_ascii_whitespace() {
        name_end -= 1;
    }
    values[base] = Some(BString::from(&text[..name_end]));
    if email_start >= len {
        return;
    }

    // email: between '<' and '>'
    let mut gt = email_start + 1;
    while gt < len && text[gt] != b'>' {
        gt += 1;
    }
    if gt >= len {
        return;
    }
    values[base + 1] = Some(BString::from(&text[email_start..gt]));

    // date: decimal seconds
    let mut at = gt + 1;
    while at < len && text[at].is_ascii_whitespace() {
        at += 1;
    }
    if at >= len {
        return;
    }
    let (seconds, used) = crate::pretty::scan_decimal(&text[at..]);
    if used == 0 {
        return;
    }
    values[base + 5] = Some(BString::from(&text[at..at + used]));

    // tz: sign character plus digits, one position past the date
    let mut t = at + used + 1;
    while t < len && text[t].is_ascii_whitespace() {
        t += 1;
    }
    let mut tz: i32 = 0;
    if t + 1 < len {
        let mut v: i64 = 0;
        let mut d = t + 1;
        while d < len && text[d].is_ascii_digit() {
            v = v.saturating_mul(10).saturating_add(i64::from(text[d] - b'0'));
            d += 1;
        }
        tz = v.clamp(0, i64::from(i32::MAX)) as i32;
        if text[t] == b'-' {
            tz = -tz;
        }
    }

    let date = Date::from_decimal_offset(i64::try_from(seconds).unwrap_or(i64::MAX), tz);
    values[base + 2] = Some(date.format(DateStyle::Default).into());
    values[base + 3] = Some(date.format(DateStyle::Rfc2822).into());
    values[base + 4] = Some(date.format(DateStyle::Relative).into());
    values[base + 6] = Some(date.format(DateStyle::Iso).into());
}

fn interpolate(template: &str, values: &[BString]) -> BString {
    let bytes = template.as_bytes();
    let mut out: Vec<u8> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(at) = TOKENS
                .iter()
                .position(|token| bytes[i..].starts_with(token.as_bytes()))
            {
                out.extend_from_slice(values[at].as_slice());
                i += TOKENS[at].len();
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    BString::from(out)
}
