//! Terse macros for everyday usage

/// Build a [`CommandSpec`](crate::cmd::CommandSpec) from a program and its arguments.
#[macro_export]
macro_rules! sh_cmd {
    ($prog:expr $(, $arg:expr)* $(,)?) => {{
        $crate::cmd::CommandSpec::new($prog) $( .arg($arg) )*
    }};
}

/// Build and run a command on the default executor.
#[macro_export]
macro_rules! sh_run {
    ($prog:expr $(, $arg:expr)* $(,)?) => {{
        $crate::easy::exec($crate::sh_cmd!($prog $(, $arg)*))
    }};
}
