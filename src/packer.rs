//! Self-extracting eval packer for rendered bundles.
//!
//! Follows the classic p.a.c.k.e.r. scheme: every word is swapped for the
//! base62 index of its slot in a frequency-sorted dictionary, and the result is
//! wrapped in an `eval` that rebuilds the source at load time. Everything
//! between words, line breaks included, is kept verbatim.

use std::collections::HashMap;
use tracing::debug;

const BASE: usize = 62;

/// Decoder prefix; the packed payload, base, word count and dictionary follow it
const DECODER: &str = r"eval(function(p,a,c,k,e,r){e=function(c){return(c<a?'':e(parseInt(c/a)))+((c=c%a)>35?String.fromCharCode(c+29):c.toString(36))};if(!''.replace(/^/,String)){while(c--)r[e(c)]=k[c]||e(c);k=[function(e){return r[e]}];e=function(){return'\\w+'};c=1};while(c--)if(k[c])p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c]);return p}";

/// Pack `code` into a self-executing eval wrapper
pub fn pack(code: &str) -> String {
    let (payload, words) = encode_words(code);

    debug!("Packed {} bytes with {} dictionary words", code.len(), words.len());

    let keywords = words
        .iter()
        .enumerate()
        .map(|(i, word)| if *word == encode(i) { "" } else { word.as_str() })
        .collect::<Vec<_>>()
        .join("|");

    format!(
        "{DECODER}('{}',{BASE},{},'{}'.split('|'),0,{{}}))\n",
        escape_js_string(&payload),
        words.len(),
        keywords
    )
}

/// Replace every word with its dictionary code.
///
/// Words are maximal runs of `[A-Za-z0-9_]`, the same runs the decoder's
/// `\b\w+\b` finds. The dictionary is ordered by descending frequency, ties
/// broken by first appearance.
fn encode_words(code: &str) -> (String, Vec<String>) {
    let runs = split_words(code);

    let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
    for (order, word) in runs.iter().filter_map(|run| run.word()).enumerate() {
        stats.entry(word).or_insert((0, order)).0 += 1;
    }

    let mut words: Vec<(&str, usize, usize)> = stats
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let codes: HashMap<&str, String> = words
        .iter()
        .enumerate()
        .map(|(i, (word, _, _))| (*word, encode(i)))
        .collect();

    let mut payload = String::with_capacity(code.len());
    for run in &runs {
        match run {
            Run::Word(word) => payload.push_str(&codes[word]),
            Run::Other(text) => payload.push_str(text),
        }
    }

    let words = words.into_iter().map(|(word, _, _)| word.to_string()).collect();
    (payload, words)
}

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Word(&'a str),
    Other(&'a str),
}

impl<'a> Run<'a> {
    fn word(&self) -> Option<&'a str> {
        match self {
            Run::Word(word) => Some(word),
            Run::Other(_) => None,
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn split_words(code: &str) -> Vec<Run<'_>> {
    let bytes = code.as_bytes();
    let mut runs = Vec::new();
    let mut start = 0;

    while start < bytes.len() {
        let in_word = is_word_byte(bytes[start]);
        let mut end = start + 1;
        while end < bytes.len() && is_word_byte(bytes[end]) == in_word {
            end += 1;
        }
        // Word bytes are ASCII, so every boundary is a char boundary
        let text = &code[start..end];
        runs.push(if in_word { Run::Word(text) } else { Run::Other(text) });
        start = end;
    }

    runs
}

/// Base62 code the decoder's `e` function produces for `index`
fn encode(index: usize) -> String {
    let digit = index % BASE;
    let digit = match digit {
        0..=9 => (b'0' + digit as u8) as char,
        10..=35 => (b'a' + (digit - 10) as u8) as char,
        _ => (b'A' + (digit - 36) as u8) as char,
    };

    if index < BASE {
        digit.to_string()
    } else {
        let mut code = encode(index / BASE);
        code.push(digit);
        code
    }
}

fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 16);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(payload: &str, words: &[String]) -> String {
        let lookup: HashMap<String, &str> = words
            .iter()
            .enumerate()
            .map(|(i, word)| (encode(i), word.as_str()))
            .collect();

        split_words(payload)
            .into_iter()
            .map(|run| match run {
                Run::Word(code) => lookup[code],
                Run::Other(text) => text,
            })
            .collect()
    }

    #[test]
    fn test_encode_matches_decoder() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "a");
        assert_eq!(encode(35), "z");
        assert_eq!(encode(36), "A");
        assert_eq!(encode(61), "Z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(62 * 62 + 11), "10b");
    }

    #[test]
    fn test_split_words() {
        let runs = split_words("a.b_1(\"é\")");
        assert_eq!(
            runs,
            vec![
                Run::Word("a"),
                Run::Other("."),
                Run::Word("b_1"),
                Run::Other("(\"é\")"),
            ]
        );
    }

    #[test]
    fn test_dictionary_ordered_by_frequency() {
        let (payload, words) = encode_words("foo(bar);foo(baz);foo(bar)");
        assert_eq!(words, vec!["foo", "bar", "baz"]);
        assert_eq!(payload, "0(1);0(2);0(1)");
    }

    #[test]
    fn test_encoding_is_reversible() {
        let code = "function add(a,b){return a+b}var x=add(1,2);console.log('x is',x,\"\\n\");";
        let (payload, words) = encode_words(code);
        assert_eq!(decode(&payload, &words), code);
    }

    #[test]
    fn test_escape_js_string() {
        assert_eq!(escape_js_string("a'b\\c\nd"), "a\\'b\\\\c\\nd");
    }

    /// Split packed output back into its payload and dictionary, then decode
    fn unpack(packed: &str) -> String {
        let args = packed
            .strip_prefix(DECODER)
            .and_then(|rest| rest.strip_prefix("('"))
            .unwrap();
        // Dictionary words are bare `\w` runs, so the last `',62,` ends the payload
        let (payload, rest) = args.rsplit_once("',62,").unwrap();
        let (count, rest) = rest.split_once(",'").unwrap();
        let (keywords, tail) = rest.split_once("'.split('|')").unwrap();
        assert_eq!(tail, ",0,{}))\n");

        let words: Vec<String> = keywords
            .split('|')
            .enumerate()
            .map(|(i, word)| if word.is_empty() { encode(i) } else { word.to_string() })
            .collect();
        assert_eq!(words.len(), count.parse::<usize>().unwrap());

        decode(&unescape_js_string(payload), &words)
    }

    fn unescape_js_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next().unwrap() {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                'u' => {
                    let hex: String = chars.by_ref().take(4).collect();
                    out.push(char::from_u32(u32::from_str_radix(&hex, 16).unwrap()).unwrap());
                }
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn test_pack_wraps_in_eval() {
        let code = "var answer = 42;\nfunction get() { return answer; }\n";
        let packed = pack(code);

        assert!(packed.starts_with("eval(function(p,a,c,k,e,r)"));
        assert!(packed.contains(",62,"));
        assert!(packed.contains("'.split('|'),0,{}))"));
        assert_ne!(packed, code);
        assert_eq!(unpack(&packed), code);
    }

    #[test]
    fn test_pack_keeps_semicolon_free_code_intact() {
        let code = "(function (g) {\n  const a = 1\n  let b = a + 1\n  g.out = String(a + b)\n})(globalThis)\n";
        let packed = pack(code);

        assert_eq!(unpack(&packed), code);
    }

    #[test]
    fn test_pack_keeps_line_break_after_return() {
        let code = "function f(){return\n42}\nmodule.exports = f\n";
        assert_eq!(unpack(&pack(code)), code);
    }

    #[test]
    fn test_pack_preserves_quotes_and_escapes() {
        let code = "var s = 'it\\'s'\r\nvar t = \"a\\\\b\"\u{2028}console.log(s, t)\n";
        assert_eq!(unpack(&pack(code)), code);
    }

    #[test]
    fn test_self_coded_words_are_blank() {
        // "0" is the most frequent word and its own code
        let packed = pack("0+0+0+x");
        assert!(packed.contains("'|x'.split('|')"));
        assert_eq!(unpack(&packed), "0+0+0+x");
    }
}
