// Shorthands around `combine::parser!` so that every parser in this crate
// works over `&str` range streams with the same where-clause.

macro_rules! p (
    ($name:ident( $($arg: ident :  $arg_type: ty),* ) -> $ret:ty, $code:expr) => (
        combine::parser!{
            pub fn $name['a, I]($($arg : $arg_type),*)(I) -> $ret
                where
                [I: combine::stream::RangeStream<
                 Range = &'a str,
                 Token = char>,
                 I::Error: combine::ParseError<char, &'a str, <I as combine::stream::StreamOnce>::Position>,
            ]            {
                $code
            }
        }
    );
);

macro_rules! wrapper {
    ($name:ident($delegate: ident), $code:expr) => (
        combine::parser!{
            pub fn $name['a, I, P]($delegate: P)(I) -> P::Output
                where
                [I: combine::stream::RangeStream<
                 Range = &'a str,
                 Token = char>,
                 I::Error: combine::ParseError<char, &'a str, <I as combine::stream::StreamOnce>::Position>,
                 P: combine::Parser<I>,
            ]            {
                $code
            }
        }
    );
}
