//! Movetext documents: line-ending/header normalization, tag pairs, and the
//! mainline SAN tokens. Legality is left to whoever replays the tokens.

use shakmaty::san::SanPlus;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedMovetext {
    pub tags: Vec<(String, String)>,
    pub sans: Vec<String>,
}

impl ParsedMovetext {
    /// First tag named `key`, compared case-insensitively.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }

    /// Start position declared by the tags, if any.
    pub fn start_fen(&self) -> Option<&str> {
        self.tag("FEN").map(str::trim).filter(|f| !f.is_empty())
    }
}

fn is_tag_line(line: &str) -> bool {
    line.trim_start().starts_with('[')
}

/// Canonical layout: LF endings, no BOM, no outer blank lines, and exactly
/// one blank line between the tag section and the movetext body.
pub fn normalize(text: &str) -> String {
    let unified = text.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = unified.lines().map(str::trim_end).skip_while(|l| l.trim().is_empty()).collect();
    let header_len = lines.iter().take_while(|l| is_tag_line(l)).count();
    let headers: Vec<&str> = lines[..header_len].iter().map(|l| l.trim()).collect();
    let body: Vec<&str> = lines[header_len..].iter().copied().skip_while(|l| l.trim().is_empty()).collect();
    let body = body.join("\n");
    let body = body.trim_end();
    match (headers.is_empty(), body.is_empty()) {
        (true, _) => body.to_string(),
        (false, true) => headers.join("\n"),
        (false, false) => format!("{}\n\n{}", headers.join("\n"), body),
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() { out.push(next); }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_tag_line(line: &str) -> Option<(String, String)> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    let (key, rest) = inner.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((key.to_string(), unescape(value)))
}

fn is_result(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

// `4.`, `4...`, `4.e4` and a bare `4` lose their number; `0-0` is left alone.
fn strip_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == token.len() || rest.is_empty() { return rest; }
    match rest.strip_prefix('.') {
        Some(after) => after.trim_start_matches('.'),
        None => token,
    }
}

// None: token carries no move. Err: token is not movetext at all.
fn move_token(raw: &str) -> Result<Option<String>, String> {
    if is_result(raw) || raw.starts_with('$') || raw == "e.p." {
        return Ok(None);
    }
    let stripped = strip_move_number(raw).trim_end_matches(['!', '?']);
    let castle;
    let token = if stripped.starts_with("0-0") {
        castle = stripped.replace('0', "O");
        castle.as_str()
    } else {
        stripped
    };
    if token.is_empty() { return Ok(None); }
    match token.parse::<SanPlus>() {
        Ok(_) => Ok(Some(token.to_string())),
        Err(_) => Err(format!("unexpected token '{raw}'")),
    }
}

fn tokenize(body: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = body.chars();
    let mut at_line_start = true;

    fn flush(current: &mut String, depth: usize, tokens: &mut Vec<String>) {
        if !current.is_empty() {
            if depth == 0 { tokens.push(std::mem::take(current)); } else { current.clear(); }
        }
    }

    while let Some(c) = chars.next() {
        let line_start = at_line_start;
        at_line_start = c == '\n';
        match c {
            '%' if line_start => {
                for n in chars.by_ref() { if n == '\n' { at_line_start = true; break; } }
            }
            '{' => {
                flush(&mut current, depth, &mut tokens);
                let mut closed = false;
                for n in chars.by_ref() { if n == '}' { closed = true; break; } }
                if !closed { return Err("unterminated comment".to_string()); }
            }
            '}' => return Err("unexpected '}'".to_string()),
            ';' => {
                flush(&mut current, depth, &mut tokens);
                for n in chars.by_ref() { if n == '\n' { at_line_start = true; break; } }
            }
            '(' => {
                flush(&mut current, depth, &mut tokens);
                depth += 1;
            }
            ')' => {
                flush(&mut current, depth, &mut tokens);
                if depth == 0 { return Err("unexpected ')'".to_string()); }
                depth -= 1;
            }
            c if c.is_whitespace() => flush(&mut current, depth, &mut tokens),
            c => current.push(c),
        }
    }
    flush(&mut current, depth, &mut tokens);
    if depth > 0 { return Err("unterminated variation".to_string()); }
    Ok(tokens)
}

/// Splits a document into tags and mainline SAN tokens. Variations, comments,
/// NAGs, move numbers and the result marker are dropped.
pub fn parse(document: &str) -> Result<ParsedMovetext, String> {
    let normalized = normalize(document);
    let lines: Vec<&str> = normalized.lines().collect();
    let header_len = lines.iter().take_while(|l| is_tag_line(l)).count();
    let mut tags = Vec::with_capacity(header_len);
    for line in &lines[..header_len] {
        match parse_tag_line(line) {
            Some(tag) => tags.push(tag),
            None => return Err(format!("malformed tag line: {line}")),
        }
    }
    let body = lines[header_len..].join("\n");
    let mut sans = Vec::new();
    for raw in tokenize(&body)? {
        if let Some(san) = move_token(&raw)? { sans.push(san); }
    }
    Ok(ParsedMovetext { tags, sans })
}
