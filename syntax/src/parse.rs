use anyhow::Result;

#[derive(Debug, thiserror::Error)]
#[error("ParseError on line {line_num} (offset {pos}) '{line}': {msg}")]
pub struct Error {
    msg: String,
    pos: usize,
    line_num: usize,
    line: String,
}

/// Parse the text of a manifest or startup file into a list of items.
pub fn parse(text: &str) -> Result<Vec<crate::ast::Item<'_>>> {
    use combine::EasyParser;
    file::items()
        .easy_parse(text)
        .map(|(items, _remainder)| items)
        .map_err(|e| {
            let pos = e.position.translate_position(text);
            // isolate the line in question:
            let before = &text[0..pos];
            let after = &text[pos..text.len()];
            let prefix: String = before.chars().rev().take_while(|&c| c != '\n').collect();
            let prefix: String = prefix.chars().rev().collect();
            let suffix: String = after.chars().take_while(|&c| c != '\n').collect();
            let line = prefix + &suffix;
            let line_num = before.matches('\n').count() + 1;
            Error {
                pos,
                line_num,
                line,
                msg: describe(&e.errors),
            }
            .into()
        })
}

/// e.g. "unexpected '"', expected ']' or ','".
fn describe(errors: &[combine::easy::Error<char, &str>]) -> String {
    use combine::easy::Error as E;
    let mut unexpected = Vec::with_capacity(1);
    let mut expected = Vec::with_capacity(errors.len());
    let mut messages = Vec::with_capacity(0);
    for e in errors {
        match e {
            E::Unexpected(info) => unexpected.push(describe_info(info)),
            E::Expected(info) => expected.push(describe_info(info)),
            E::Message(info) => messages.push(describe_info(info)),
            E::Other(e) => messages.push(e.to_string()),
        }
    }
    expected.dedup();

    let mut parts = Vec::with_capacity(2 + messages.len());
    if !unexpected.is_empty() {
        parts.push(format!("unexpected {}", unexpected.join(", ")));
    }
    if !expected.is_empty() {
        parts.push(format!("expected {}", expected.join(" or ")));
    }
    parts.extend(messages);
    parts.join(", ")
}

fn describe_info(info: &combine::easy::Info<char, &str>) -> String {
    use combine::easy::Info;
    match info {
        Info::Token('\n') => "newline".to_owned(),
        Info::Token(c) => format!("'{c}'"),
        Info::Range(r) => format!("'{r}'"),
        Info::Owned(s) => s.clone(),
        Info::Static(s) => (*s).to_owned(),
    }
}

pub mod prelude {
    pub use combine::parser::char::{char, string};
    pub use combine::parser::range::recognize;
    pub use combine::*;
}

pub mod util {

    use super::prelude::*;
    use combine::parser::char::{alpha_num, letter, space};

    p! {
        ident_start() -> char, {
            char('_').or(letter())
        }
    }

    p! {
        ident_rest() -> Vec<char>, {
            many(char('_').or(alpha_num()))
        }
    }

    p! {
        ident() -> &'a str, {
            recognize(ident_start().and(ident_rest()))
        }
    }

    // NB doesn't consume the newline, so it can end a line.
    p! {
        comment() -> &'a str, {
            recognize(
                char('#')
                .and(skip_many(none_of("\n".chars())))
            )
        }
    }

    p! {
        whitespace() -> (), {
            skip_many1(
                space().map(|_| ()).or(comment().map(|_| ()))
            )
        }
    }

    wrapper! {
        lex(parser), {
            optional(whitespace()).with(parser).skip(optional(whitespace()))
        }
    }

    p! {
        line_internal_whitespace() -> (), {
            skip_many1(satisfy(|c: char| c.is_whitespace() && c != '\n'))
        }
    }

    wrapper! {
        lex_inline(parser), {
            optional(line_internal_whitespace())
                .with(parser)
                .skip(optional(line_internal_whitespace()))
        }
    }

    wrapper! {
        braces(parser), {
            char('{').with(parser).skip(char('}'))
        }
    }

    wrapper! {
        brackets(parser), {
            char('[').with(parser).skip(char(']'))
        }
    }

    p! {
        eol() -> (), {
            optional(comment()).with(
                eof().or(char('\n').and(optional(whitespace())).map(|_| ()))
            )
        }
    }

    wrapper! {
        line(parser), {
            lex_inline(parser).skip(eol())
        }
    }

    #[cfg(test)]
    mod test {
        use anyhow::Result;
        use combine::parser::char::char;
        use combine::EasyParser;
        #[test]
        fn test_ident() -> Result<()> {
            assert_eq!("my_name", super::ident().easy_parse("my_name").unwrap().0);
            assert_eq!(
                "_start_under123",
                super::ident().easy_parse("_start_under123").unwrap().0
            );
            assert!(super::ident().easy_parse("1name").is_err());
            Ok(())
        }
        #[test]
        fn test_whitespace() -> Result<()> {
            assert_eq!(
                ((), "and more"),
                super::whitespace().easy_parse(" and more").unwrap()
            );
            assert_eq!(
                ((), "and text"),
                super::whitespace().easy_parse(" # a comment\n    and text").unwrap()
            );
            assert!(super::whitespace().easy_parse("x").is_err());
            Ok(())
        }
        #[test]
        fn test_lex_inline() -> Result<()> {
            assert_eq!(
                'x',
                super::lex_inline(char('x')).easy_parse("  x  ").unwrap().0
            );
            assert!(super::lex_inline(char('x')).easy_parse("\nx").is_err());
            assert_eq!(
                ('x', "\n"),
                super::lex_inline(char('x')).easy_parse("x\n").unwrap()
            );
            Ok(())
        }
        #[test]
        fn test_eol() -> Result<()> {
            assert_eq!(
                ((), "other stuff"),
                super::eol().easy_parse("\n  \n   other stuff").unwrap()
            );
            assert_eq!(
                ((), "next"),
                super::eol().easy_parse("# trailing comment\nnext").unwrap()
            );
            assert_eq!(((), ""), super::eol().easy_parse("").unwrap());
            Ok(())
        }
        #[test]
        fn test_line() -> Result<()> {
            assert_eq!('x', super::line(char('x')).easy_parse(" x").unwrap().0);
            assert_eq!('x', super::line(char('x')).easy_parse(" x\n").unwrap().0);
            Ok(())
        }
    }
}

mod literal {

    use super::prelude::*;

    const FORBID_UNQUOTED: [char; 8] = ['[', ']', '{', '}', ',', '=', '#', '"'];

    wrapper! {
        double_quotes(parser), {
            char('"').with(parser).skip(char('"'))
        }
    }

    p! {
        double_quoted_literal() -> &'a str, {
            double_quotes(recognize(skip_many(none_of("\"\n".chars()))))
        }
    }

    p! {
        unquoted_literal_char() -> char, {
            satisfy(|c: char|
                !c.is_whitespace() && !FORBID_UNQUOTED.iter().any(|&forbidden| forbidden == c)
            )
        }
    }

    p! {
        unquoted_literal() -> &'a str, {
            recognize(skip_many1(unquoted_literal_char()))
        }
    }

    p! {
        literal() -> &'a str, {
            double_quoted_literal().or(unquoted_literal())
        }
    }

}

mod value {

    use super::literal::literal;
    use super::prelude::*;
    use super::util::{brackets, lex, whitespace};
    use crate::ast::Value;

    p! {
        list() -> Vec<&'a str>, {
            brackets(
                optional(whitespace())
                    .with(sep_end_by(lex(literal()), lex(char(','))))
            )
        }
    }

    p! {
        value() -> Value<'a>, {
            list().map(Value::List).or(literal().map(Value::Literal))
        }
    }

}

mod assignment {

    use super::prelude::*;
    use super::util::{ident, lex_inline, line};
    use super::value::value;
    use crate::ast::Value;

    p! {
        assignment() -> (&'a str, Value<'a>), {
            ident().skip(lex_inline(char('='))).and(lex_inline(value()))
        }
    }

    p! {
        setting_line() -> (&'a str, Value<'a>), {
            line(assignment())
        }
    }

}

mod package {

    use super::assignment::assignment;
    use super::literal::literal;
    use super::prelude::*;
    use super::util::{braces, eol, lex, lex_inline, line_internal_whitespace, whitespace};
    use crate::ast::{Entry, PackageBlock, Value};

    // a field can end its line, or be the last thing before a closing brace.
    p! {
        field_end() -> (), {
            eol().or(look_ahead(char('}')).map(|_| ()))
        }
    }

    p! {
        field() -> (&'a str, Value<'a>), {
            lex_inline(assignment()).skip(field_end())
        }
    }

    p! {
        configuration_block() -> Vec<(&'a str, Value<'a>)>, {
            attempt(lex_inline(string("configuration")).skip(look_ahead(char('{'))))
                .with(braces(optional(whitespace()).with(many(field()))))
                .skip(optional(line_internal_whitespace()))
                .skip(field_end())
        }
    }

    p! {
        entry() -> Entry<'a>, {
            choice!(
                configuration_block().map(Entry::Configuration),
                field().map(Entry::Field)
            )
        }
    }

    p! {
        package_keyword() -> (), {
            attempt(string("package").skip(line_internal_whitespace())).map(|_| ())
        }
    }

    p! {
        package_block() -> PackageBlock<'a>, {
            package_keyword()
                .with(lex(literal()))
                .and(braces(optional(whitespace()).with(many(entry()))))
                .map(|(identifier, entries): (&'a str, Vec<Entry<'a>>)| {
                    PackageBlock::from_entries(identifier, entries)
                })
        }
    }

}

mod file {
    use super::{
        assignment::setting_line, package::package_block, prelude::*, util::lex,
        util::whitespace,
    };
    use crate::ast::Item;

    p! {
        item() -> Item<'a>, {
            choice!(
                package_block().map(Item::Package),
                setting_line().map(Item::Setting)
            )
        }
    }

    p! {
        items() -> Vec<Item<'a>>, {
            optional(whitespace()).with(many(lex(item()))).skip(eof())
        }
    }
}

#[cfg(test)]
mod test {
    use crate::ast::{Item, Value};
    use anyhow::Result;

    #[test]
    fn test_startup_file() -> Result<()> {
        let text = "# startup\npackage_dir = packages\nuser_package_dir = \"my packages\"\n\
            enabled = [basic, vtk]\n";
        assert_eq!(
            vec![
                Item::Setting(("package_dir", Value::Literal("packages"))),
                Item::Setting(("user_package_dir", Value::Literal("my packages"))),
                Item::Setting(("enabled", Value::List(vec!["basic", "vtk"]))),
            ],
            super::parse(text)?
        );
        Ok(())
    }

    #[test]
    fn test_manifest_file() -> Result<()> {
        let text = "\n# the basic package\npackage org.vistrails.basic {\n  name = \"Basic Modules\"\n}\n";
        let items = super::parse(text)?;
        assert_eq!(items.len(), 1);
        match &items[0] {
            Item::Package(block) => {
                assert_eq!(block.identifier, "org.vistrails.basic");
                assert_eq!(block.fields, vec![("name", Value::Literal("Basic Modules"))]);
            }
            other => panic!("expected a package, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_package_dir_is_not_a_package() -> Result<()> {
        let items = super::parse("package_dir = pkgs")?;
        assert_eq!(
            items,
            vec![Item::Setting(("package_dir", Value::Literal("pkgs")))]
        );
        Ok(())
    }

    #[test]
    fn test_error_reports_line() {
        let text = "package_dir = packages\nenabled = [a, b\n";
        let e = super::parse(text).unwrap_err();
        let e = e.downcast::<super::Error>().unwrap();
        assert_eq!(e.line_num, 3);
        assert!(super::parse("package p {\n name = \n}").is_err());
    }

    #[test]
    fn test_error_message_is_readable() {
        let e = super::parse("enabled = [a\"b]\n").unwrap_err();
        let e = e.downcast::<super::Error>().unwrap();
        assert_eq!(e.line_num, 1);
        assert!(e.msg.starts_with("unexpected '\"'"), "{}", e.msg);
        assert!(e.msg.contains("expected"), "{}", e.msg);
        assert!(!e.msg.contains("PointerOffset"), "{}", e.msg);
        assert!(!e.to_string().contains("PointerOffset"));
    }

    #[test]
    fn test_trailing_garbage_is_an_error() {
        assert!(super::parse("a = b\n}").is_err());
    }
}
