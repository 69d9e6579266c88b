use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new_spanned(
                    &model_ident,
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(
                &model_ident,
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let wealthform = wealthform_path();
    let mut key_methods = Vec::new();
    let mut specs = Vec::new();
    let mut inserts = Vec::new();
    let mut reads = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;
        let field_name = field_ident.to_string();
        let key = quote!(#wealthform::form::FieldKey::new(#field_name));

        key_methods.push(quote! {
            pub const fn #field_ident(&self) -> #wealthform::form::FieldKey {
                #key
            }
        });
        specs.push(quote! {
            #wealthform::form::FieldSpec::typed::<#field_ty>(#key)
        });
        inserts.push(quote! {
            values.insert(
                #key,
                <#field_ty as #wealthform::form::FieldType>::into_field_value(self.#field_ident),
            );
        });
        reads.push(quote! {
            #field_ident: #wealthform::form::read_field::<#field_ty>(values, #key)?,
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#key_methods)*
        }

        impl #wealthform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_specs() -> ::std::vec::Vec<#wealthform::form::FieldSpec> {
                ::std::vec![#(#specs),*]
            }

            fn into_values(self) -> #wealthform::form::FormValues {
                let mut values = #wealthform::form::FormValues::new();
                #(#inserts)*
                values
            }

            fn from_values(
                values: &#wealthform::form::FormValues,
            ) -> #wealthform::form::FormResult<Self> {
                ::std::result::Result::Ok(Self {
                    #(#reads)*
                })
            }
        }
    }
    .into()
}

fn wealthform_path() -> TokenStream2 {
    match crate_name("wealthform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::wealthform),
    }
}
