//! Reads the selector string dialect back into a [`Selector`].
//!
//! Only the forms the builder emits are accepted:
//!
//! ```text
//! selector  := path ( "|" path )*
//! path      := "//" step ( "/" step )* ( "/.." )*
//! step      := tag class? filter?
//! class     := "[@class=" literal "]"
//!            | "[" contains ( " and " contains )* "]"
//!            | "[(" contains-list ")" ( " or (" contains-list ")" )* "]"
//! contains  := "contains(@class, " literal ")"
//! literal   := '"' chars '"' | "'" chars "'" | "concat(" literal ( ", " literal )* ")"
//! filter    := "[" tag "]" | "[not(*) and string-length(text()) (> | =) 0]"
//! ```
//!
//! A filter is only valid on the last step.

use std::str::FromStr;

use super::{ChildFilter, ClassPredicate, Path, Selector, Step};
use crate::{HarvestError, Result};

impl FromStr for Selector {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        let mut cursor = Cursor::new(s);
        let mut paths = vec![cursor.path()?];

        loop {
            cursor.skip_ws();
            if cursor.is_empty() {
                break;
            }
            cursor.expect("|")?;
            cursor.skip_ws();
            paths.push(cursor.path()?);
        }

        if paths.len() == 1 {
            Ok(Selector::Path(paths.remove(0)))
        } else {
            Ok(Selector::Union(paths))
        }
    }
}

struct Cursor<'s> {
    src: &'s str,
    rest: &'s str,
}

impl<'s> Cursor<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, rest: src.trim() }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.eat(token) { Ok(()) } else { Err(self.error(format!("expected '{}'", token))) }
    }

    fn ident(&mut self) -> Result<&'s str> {
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.error("expected a tag name".to_string()));
        }
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(ident)
    }

    /// Consumes everything up to `delim` and the delimiter itself.
    fn until(&mut self, delim: char) -> Result<&'s str> {
        let end = self
            .rest
            .find(delim)
            .ok_or_else(|| self.error(format!("unterminated value, missing '{}'", delim)))?;
        let value = &self.rest[..end];
        self.rest = &self.rest[end + delim.len_utf8()..];
        Ok(value)
    }

    fn error(&self, reason: String) -> HarvestError {
        HarvestError::InvalidSelector {
            selector: self.src.to_string(),
            reason: format!("{} at offset {}", reason, self.src.len() - self.rest.len()),
        }
    }

    fn path(&mut self) -> Result<Path> {
        self.expect("//")?;

        let mut steps = Vec::new();
        let mut filter = None;
        let mut parent_steps = 0;

        loop {
            if filter.is_some() {
                return Err(self.error("filter is only allowed on the last step".to_string()));
            }
            let (step, step_filter) = self.step()?;
            steps.push(step);
            filter = step_filter;

            while self.eat("/..") {
                parent_steps += 1;
            }
            if parent_steps > 0 || !self.eat("/") {
                break;
            }
        }

        Ok(Path { steps, filter, parent_steps })
    }

    fn step(&mut self) -> Result<(Step, Option<ChildFilter>)> {
        let mut step = Step::new(self.ident()?);
        let mut filter = None;

        while self.eat("[") {
            if filter.is_some() {
                return Err(self.error("unexpected predicate after filter".to_string()));
            }

            if self.eat("@class=") {
                let value = self.literal()?;
                self.set_class(&mut step, ClassPredicate::Equals(value))?;
            } else if self.rest.starts_with("contains(") {
                let words = self.contains_list()?;
                self.set_class(&mut step, ClassPredicate::ContainsAll(words))?;
            } else if self.rest.starts_with('(') {
                let groups = self.any_of()?;
                self.set_class(&mut step, ClassPredicate::AnyOf(groups))?;
            } else if self.eat("not(*)") {
                filter = Some(self.leaf_filter()?);
            } else {
                filter = Some(ChildFilter::Child(self.ident()?.to_string()));
            }

            self.expect("]")?;
        }

        Ok((step, filter))
    }

    fn set_class(&self, step: &mut Step, class: ClassPredicate) -> Result<()> {
        if step.class.is_some() {
            return Err(self.error("step has more than one class predicate".to_string()));
        }
        step.class = Some(class);
        Ok(())
    }

    fn contains_list(&mut self) -> Result<Vec<String>> {
        let mut words = Vec::new();
        loop {
            self.expect("contains(@class,")?;
            self.skip_ws();
            words.push(self.literal()?);
            self.skip_ws();
            self.expect(")")?;
            self.skip_ws();
            if !self.eat("and") {
                break;
            }
            self.skip_ws();
        }
        Ok(words)
    }

    fn literal(&mut self) -> Result<String> {
        if !self.eat("concat(") {
            return self.quoted().map(str::to_string);
        }
        let mut value = String::new();
        loop {
            self.skip_ws();
            value.push_str(self.quoted()?);
            self.skip_ws();
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(value)
    }

    fn quoted(&mut self) -> Result<&'s str> {
        if self.eat("\"") {
            self.until('"')
        } else if self.eat("'") {
            self.until('\'')
        } else {
            Err(self.error("expected a quoted value".to_string()))
        }
    }

    fn any_of(&mut self) -> Result<Vec<Vec<String>>> {
        let mut groups = Vec::new();
        loop {
            self.expect("(")?;
            groups.push(self.contains_list()?);
            self.expect(")")?;
            self.skip_ws();
            if !self.eat("or") {
                break;
            }
            self.skip_ws();
        }
        Ok(groups)
    }

    fn leaf_filter(&mut self) -> Result<ChildFilter> {
        self.skip_ws();
        self.expect("and")?;
        self.skip_ws();
        self.expect("string-length(text())")?;
        self.skip_ws();
        let filter = if self.eat(">") {
            ChildFilter::TextLeaf
        } else if self.eat("=") {
            ChildFilter::EmptyLeaf
        } else {
            return Err(self.error("expected '>' or '='".to_string()));
        };
        self.skip_ws();
        self.expect("0")?;
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"//div[@class="message-body"]/.."#)]
    #[case("//html/body/div/div")]
    #[case(r#"//div[@class=""]/span"#)]
    #[case("//td[contains(@class, 'forum_message')]/..")]
    #[case("//div[contains(@class, 'post') and contains(@class, 'row')]/../..")]
    #[case(r#"//div[@class="message-author"]/a[not(*) and string-length(text()) > 0]"#)]
    #[case(r#"//div[@class="meta"]/span[not(*) and string-length(text()) = 0]"#)]
    #[case(r#"//div[@class="meta"]/a[img]"#)]
    #[case(
        "//div[(contains(@class, 'post') and contains(@class, 'post-even')) or (contains(@class, 'post-odd'))]/a[not(*) and string-length(text()) > 0]"
    )]
    #[case(r#"//div[@class="a"]/span | //div[@class="b"]/a[not(*) and string-length(text()) > 0]"#)]
    #[case(r#"//div[@class='say "hi"']/p[not(*) and string-length(text()) > 0]"#)]
    #[case(r#"//td[contains(@class, "it's")]/.."#)]
    #[case(r#"//div[@class=concat("it's ", '"', "quoted", '"', "")]"#)]
    fn test_round_trip(#[case] raw: &str) {
        let selector: Selector = raw.parse().unwrap();
        assert_eq!(selector.to_string(), raw);
    }

    #[test]
    fn test_quoted_class_values() {
        let selector: Selector = r#"//div[@class=concat("it's ", '"', "quoted", '"')]"#.parse().unwrap();
        let path = selector.as_path().unwrap();
        assert_eq!(path.steps[0].class, Some(ClassPredicate::Equals(r#"it's "quoted""#.into())));

        let rendered = Selector::Path(path.clone()).to_string();
        assert_eq!(rendered.parse::<Selector>().unwrap(), selector);
    }

    #[test]
    fn test_parsed_structure() {
        let selector: Selector = r#"//div[@class="message-author"]/a[not(*) and string-length(text()) > 0]/.."#
            .parse()
            .unwrap();
        let path = selector.as_path().unwrap();
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.steps[0].class, Some(ClassPredicate::Equals("message-author".into())));
        assert_eq!(path.steps[1].tag, "a");
        assert_eq!(path.filter, Some(ChildFilter::TextLeaf));
        assert_eq!(path.parent_steps, 1);
    }

    #[test]
    fn test_union_parses_all_branches() {
        let selector: Selector = r#"//span[@class="guest"] | //a[@class="member"]"#.parse().unwrap();
        assert_eq!(selector.paths().len(), 2);
        assert!(selector.as_path().is_none());
    }

    #[rstest]
    #[case("")]
    #[case("div")]
    #[case("//")]
    #[case(r#"//div[@class="unterminated]"#)]
    #[case("//div[contains(@class, 'x')")]
    #[case("//div[span]/p")]
    #[case("//div/../p")]
    #[case(r#"//div[@class="a"][@class="b"]"#)]
    #[case("//div[not(*) and string-length(text()) < 0]")]
    fn test_rejects_malformed(#[case] raw: &str) {
        let err = raw.parse::<Selector>().unwrap_err();
        assert!(matches!(err, HarvestError::InvalidSelector { .. }));
    }
}
