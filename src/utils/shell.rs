/// Render a command line the way a shell would need it typed
pub(crate) fn quote_command(program: &str, args: &[String]) -> String {
    let words = std::iter::once(program).chain(args.iter().map(String::as_str));
    // try_join only fails on interior NUL bytes, which cannot reach exec anyway
    shlex::try_join(words.clone()).unwrap_or_else(|_| words.collect::<Vec<_>>().join(" "))
}
