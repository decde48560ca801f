mod generation_tests;
mod test_utils;
