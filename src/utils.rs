pub(crate) fn get_line_col(doc: &str, byte_offset: usize) -> (usize, usize) {
    let mut lineno: usize = 1;
    let mut colno: usize = 1;
    for (byte_off, char) in doc.char_indices() {
        if byte_off >= byte_offset {
            return (lineno, colno);
        }
        if char == '\n' {
            lineno += 1;
            colno = 1;
        } else {
            colno += 1;
        }
    }
    // offset at (or past) end of document: the position after the last char
    (lineno, colno)
}


pub(crate) fn escape_double_quoted(input: &str) -> String {
    // In the worst case (every char requires a backslash), the output could
    // be roughly twice the length of `input`.
    let mut escaped = String::with_capacity(input.len() * 2);

    for c in input.chars() {
        match c {
            '"'  => { escaped.push('\\'); escaped.push('"');  }
            '\\' => { escaped.push('\\'); escaped.push('\\'); }
            '\n' => { escaped.push('\\'); escaped.push('n');  }
            '\r' => { escaped.push('\\'); escaped.push('r');  }
            '\t' => { escaped.push('\\'); escaped.push('t');  }
            '\u{0008}' => { escaped.push('\\'); escaped.push('b'); }
            '\u{000c}' => { escaped.push('\\'); escaped.push('f'); }
            c if c < '\u{0020}' => {
                escaped.push_str(&format!("\\u{:04x}", c as u32));
            }
            _ => escaped.push(c),
        }
    }

    escaped
}
