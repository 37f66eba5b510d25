use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, LitInt, LitStr, parse_macro_input};

/// Bind a record type to a cache namespace with an optional default TTL.
///
/// Usage:
/// ```rust,ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// #[typed_cache(prefix = "hubspot_state", ttl = 600)]
/// struct StateData {
///     state: String,
/// }
/// ```
///
/// `prefix` defaults to the struct name. Omitting `ttl` stores entries
/// without expiration.
#[proc_macro_attribute]
pub fn typed_cache(args: TokenStream, input: TokenStream) -> TokenStream {
    let struct_def = parse_macro_input!(input as ItemStruct);
    let struct_name = &struct_def.ident;

    let mut prefix: Option<String> = None;
    let mut ttl_seconds: Option<u64> = None;
    let arg_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("ttl") {
            let lit: LitInt = meta.value()?.parse()?;
            ttl_seconds = Some(lit.base10_parse()?);
            Ok(())
        } else if meta.path.is_ident("prefix") {
            let lit: LitStr = meta.value()?.parse()?;
            prefix = Some(lit.value());
            Ok(())
        } else {
            Err(meta.error("unsupported typed_cache property, expected `prefix` or `ttl`"))
        }
    });
    parse_macro_input!(args with arg_parser);

    let prefix_impl = match prefix {
        Some(prefix) => quote! { #prefix },
        None => quote! { stringify!(#struct_name) },
    };

    let ttl_impl = match ttl_seconds {
        Some(ttl) => quote! {
            fn default_ttl() -> Option<std::time::Duration> {
                Some(std::time::Duration::from_secs(#ttl))
            }
        },
        None => quote! {
            fn default_ttl() -> Option<std::time::Duration> {
                None
            }
        },
    };

    let expanded = quote! {
        #struct_def

        impl crate::cache::CachedObject for #struct_name {
            fn cache_prefix() -> &'static str {
                #prefix_impl
            }

            #ttl_impl
        }
    };

    TokenStream::from(expanded)
}
