#![allow(missing_docs)]

pub(crate) mod html;
pub(crate) mod http;
pub(crate) mod stub_backend;

pub(crate) use html::{
    assert_valid_html, element_texts, parse_html_document, parse_html_fragment, response_text,
};
pub(crate) use http::{assert_hx_redirect, assert_redirect, get_header};
pub(crate) use stub_backend::StubBackend;
