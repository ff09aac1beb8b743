use std::fmt::{self, Write};

const INDENT: &str = "  ";
const COMMENT_WIDTH: usize = 96;

/// Line-oriented writer that tracks brace nesting.
pub(crate) struct CodeWriter<'w> {
    out: &'w mut String,
    depth: usize,
}

impl<'w> CodeWriter<'w> {
    pub fn new(out: &'w mut String) -> Self {
        CodeWriter { out, depth: 0 }
    }

    pub fn line(&mut self, text: impl fmt::Display) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.write_str(INDENT)?;
        }
        writeln!(self.out, "{}", text)
    }

    pub fn blank(&mut self) -> fmt::Result {
        self.out.write_char('\n')
    }

    /// Write `head {` and indent what follows.
    pub fn open(&mut self, head: impl fmt::Display) -> fmt::Result {
        self.line(format_args!("{} {{", head))?;
        self.depth += 1;
        Ok(())
    }

    /// Open a bare block.
    pub fn open_scope(&mut self) -> fmt::Result {
        self.line("{")?;
        self.depth += 1;
        Ok(())
    }

    pub fn close(&mut self) -> fmt::Result {
        debug_assert!(self.depth > 0, "unbalanced close");
        self.depth = self.depth.saturating_sub(1);
        self.line("}")
    }

    /// `} else {`
    pub fn reopen(&mut self, head: &str) -> fmt::Result {
        self.depth = self.depth.saturating_sub(1);
        self.line(format_args!("}} {} {{", head))?;
        self.depth += 1;
        Ok(())
    }

    /// A `//` comment, wrapped at word boundaries.
    pub fn comment(&mut self, text: &str) -> fmt::Result {
        let mut current = String::new();
        for word in text.split_whitespace() {
            if !current.is_empty() && current.len() + 1 + word.len() > COMMENT_WIDTH {
                self.line(format_args!("// {}", current))?;
                current.clear();
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if current.is_empty() {
            self.line("//")
        } else {
            self.line(format_args!("// {}", current))
        }
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting() {
        let mut out = String::new();
        let mut w = CodeWriter::new(&mut out);
        w.open("if (x)").unwrap();
        w.line("f();").unwrap();
        w.reopen("else").unwrap();
        w.line("g();").unwrap();
        w.close().unwrap();
        assert_eq!(w.depth(), 0);
        assert_eq!(out, "if (x) {\n  f();\n} else {\n  g();\n}\n");
    }

    #[test]
    fn long_comments_wrap() {
        let mut out = String::new();
        let mut w = CodeWriter::new(&mut out);
        let text = "word ".repeat(40);
        w.comment(&text).unwrap();
        assert!(out.lines().count() > 1);
        assert!(out.lines().all(|l| l.starts_with("// ") && l.len() <= COMMENT_WIDTH + 3));
    }
}
