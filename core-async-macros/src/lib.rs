//! Attribute macros backing `#[core_async::test]` and `#[core_async::main]`.
//!
//! Both expand an `async fn` into a synchronous function that drives the body
//! on a current-thread runtime owned by `core_async::runtime`. Tests may pass
//! `start_paused` to run on a paused clock, which lets timer-heavy code such
//! as the pauses between collection partitions complete instantly.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, ItemFn, Path, Token};

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Test)
}

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Main)
}

#[derive(Clone, Copy)]
enum MacroKind {
    Test,
    Main,
}

#[derive(Default)]
struct MacroOptions {
    start_paused: bool,
}

fn parse_options(attr: TokenStream, kind: MacroKind) -> syn::Result<MacroOptions> {
    let mut options = MacroOptions::default();
    if attr.is_empty() {
        return Ok(options);
    }

    let args = Punctuated::<Path, Token![,]>::parse_terminated.parse(attr)?;
    for arg in args {
        if arg.is_ident("start_paused") && matches!(kind, MacroKind::Test) {
            options.start_paused = true;
        } else {
            return Err(syn::Error::new_spanned(
                arg,
                "unsupported core_async attribute argument (expected `start_paused` on tests)",
            ));
        }
    }

    Ok(options)
}

fn expand(attr: TokenStream, item: TokenStream, kind: MacroKind) -> TokenStream {
    let options = match parse_options(attr, kind) {
        Ok(options) => options,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "core_async attribute macros require `async fn`",
        )
        .to_compile_error()
        .into();
    }

    let mut sync_sig = input.sig.clone();
    sync_sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let block = input.block;

    let runner: TokenStream2 = if options.start_paused {
        quote!(core_async::runtime::block_on_paused)
    } else {
        quote!(core_async::runtime::block_on)
    };

    let test_attr = match kind {
        MacroKind::Test => quote!(#[test]),
        MacroKind::Main => TokenStream2::new(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sync_sig {
            #runner(async move #block)
        }
    }
    .into()
}
