// Upload-and-analyze pipeline: validation, orchestration, status narrative,
// critique parsing and the HTTP handlers that front it.
// External services are reached only through the traits in `clients`.

pub mod analyzer;
pub mod critique;
pub mod handlers;
pub mod id;
pub mod prompts;
pub mod records;
pub mod status;
pub mod validation;

#[cfg(test)]
pub mod testing;
