pub mod buttons;
pub mod interaction;
pub mod levers;

#[cfg(test)]
pub(crate) mod test_support;
