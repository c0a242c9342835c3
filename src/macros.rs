// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand!

    // Zero-arg → String::new()
    () => {
        ::std::string::String::new()
    };
    // Any single expression: literals, consts, or vars
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! join {
    // String-type concatenation shorthand!
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

#[macro_export]
macro_rules! attrs {
    // Attribute map shorthand: attrs!{ "class" => "first-solved", "title" => "A" }
    () => {
        $crate::core::html::Attrs::new()
    };
    ($($k:expr => $v:expr),+ $(,)?) => {{
        let mut m = $crate::core::html::Attrs::new();
        $(
            m.insert(::std::string::String::from($k), ::std::string::String::from($v));
        )+
        m
    }};
}
