pub mod build_request;
pub(crate) mod encode_form_data;
pub(crate) mod field_rules;
pub mod file_reader;
pub(crate) mod hook_compiler;
pub(crate) mod resolve_body;
