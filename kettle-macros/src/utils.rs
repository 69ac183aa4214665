use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Only top-level commas separate arguments; commas nested inside
/// groups (`(..)`, `{..}`, `[..]`) belong to a single token tree and are
/// therefore never split.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens back into Rust source.
///
/// Going through `TokenStream` keeps the spacing the compiler needs, so
/// `async move` or `5 as u64` survive the round trip.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// Runtime options accepted by `#[kettle::main(...)]`.
#[derive(Default)]
pub(crate) struct RuntimeArgs {
    pub(crate) worker_threads: Option<usize>,
    pub(crate) starvation_limit: Option<u64>,
}

impl RuntimeArgs {
    /// Parses `key = value` pairs separated by commas. Unknown keys are ignored.
    pub(crate) fn parse(attr: TokenStream) -> Self {
        let mut args = Self::default();

        for arg in split_args(attr) {
            let text = tokens_to_string(&arg);
            let Some((key, value)) = text.split_once('=') else {
                continue;
            };

            match key.trim() {
                "worker_threads" => args.worker_threads = value.trim().parse().ok(),
                "starvation_limit" => args.starvation_limit = value.trim().parse().ok(),
                _ => {}
            }
        }

        args
    }

    /// Renders the `RuntimeBuilder` expression for these options.
    pub(crate) fn builder(&self) -> String {
        let mut builder = String::from("::kettle::RuntimeBuilder::new()");

        if let Some(n) = self.worker_threads {
            builder.push_str(&format!(".worker_threads({n})"));
        }

        if let Some(n) = self.starvation_limit {
            builder.push_str(&format!(".starvation_limit({n})"));
        }

        builder.push_str(".build()");
        builder
    }
}

/// Removes the `async` keyword and returns the position and source of the
/// function body, or `None` when the item has no braced body.
pub(crate) fn take_async_body(tokens: &mut Vec<TokenTree>) -> Option<(usize, String)> {
    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let pos = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))?;

    match &tokens[pos] {
        TokenTree::Group(g) => Some((pos, g.stream().to_string())),
        _ => None,
    }
}

/// Replaces the body at `pos` with `source`, reporting a compile error if
/// the generated code does not tokenize.
pub(crate) fn replace_body(tokens: &mut [TokenTree], pos: usize, source: &str) -> Result<(), TokenStream> {
    let stream = source.parse::<TokenStream>().map_err(|err| compile_error(&err.to_string()))?;
    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    Ok(())
}

/// Builds a `compile_error!` invocation carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}
