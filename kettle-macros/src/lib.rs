//! Procedural macros for the kettle task core.
//!
//! - `#[kettle::main]` turns an `async fn main` into a synchronous entry point
//!   that builds a runtime and blocks on the body.
//! - `#[kettle::test]` does the same for `#[test]` functions.
//! - `kettle::join!` awaits several futures concurrently from the current task.

mod utils;

use proc_macro::{TokenStream, TokenTree};

#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);
    let count = args.len();

    if count == 0 {
        return "()".parse().unwrap_or_default();
    }

    if count == 1 {
        let expr = utils::tokens_to_string(&args[0]);
        return format!("{{ ({expr}).await }}")
            .parse()
            .unwrap_or_else(|err: proc_macro::LexError| utils::compile_error(&err.to_string()));
    }

    let mut output = String::new();
    output.push_str("{\n");

    for (i, expr_tokens) in args.iter().enumerate() {
        let idx = i + 1;
        let expr = utils::tokens_to_string(expr_tokens);
        output.push_str(&format!(
            "let mut __f{idx} = (::std::boxed::Box::pin({expr}), ::core::option::Option::None::<_>);\n"
        ));
    }

    output.push_str("::std::future::poll_fn(move |cx| {\n");
    output.push_str("    use ::std::future::Future;\n");
    output.push_str("    use ::std::task::Poll;\n");

    for i in 1..=count {
        output.push_str(&format!(
            "    if __f{i}.1.is_none() {{\n\
                    if let Poll::Ready(val) = __f{i}.0.as_mut().poll(cx) {{\n\
                        __f{i}.1 = ::core::option::Option::Some(val);\n\
                    }}\n\
                }}\n"
        ));
    }

    let all_done = (1..=count)
        .map(|i| format!("__f{i}.1.is_some()"))
        .collect::<Vec<_>>()
        .join(" && ");

    output.push_str(&format!("    if {all_done} {{\n"));
    output.push_str("        Poll::Ready((\n");

    for i in 1..=count {
        output.push_str(&format!(
            "            match __f{i}.1.take() {{ ::core::option::Option::Some(v) => v, ::core::option::Option::None => unreachable!() }},\n"
        ));
    }

    output.push_str("        ))\n");
    output.push_str("    } else {\n");
    output.push_str("        Poll::Pending\n");
    output.push_str("    }\n");
    output.push_str("}).await\n");
    output.push_str("}\n");

    output
        .parse::<TokenStream>()
        .unwrap_or_else(|err| utils::compile_error(&format!("join macro error: {err}")))
}

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = utils::RuntimeArgs::parse(attr);
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some((pos, block)) = utils::take_async_body(&mut tokens) else {
        return utils::compile_error("#[kettle::main] expects a function with a body");
    };

    let new_block = format!(
        "{{
            let runtime = {};
            runtime
                .block_on(async move {{
                    {}
                }})
        }}",
        args.builder(),
        block
    );

    if let Err(err) = utils::replace_body(&mut tokens, pos, &new_block) {
        return err;
    }

    tokens.into_iter().collect()
}

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = utils::RuntimeArgs::parse(attr);
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some((pos, block)) = utils::take_async_body(&mut tokens) else {
        return utils::compile_error("#[kettle::test] expects a function with a body");
    };

    let new_block = format!(
        "{{
        let runtime = {};
        runtime
            .block_on(async move {{ {} }});
    }}",
        args.builder(),
        block
    );

    if let Err(err) = utils::replace_body(&mut tokens, pos, &new_block) {
        return err;
    }

    let mut result: Vec<TokenTree> = "#[test]".parse::<TokenStream>().unwrap_or_default().into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
