pub mod color;
#[cfg(test)]
pub mod test_utils;
pub mod url;
