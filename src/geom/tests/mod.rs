mod test_push_basic;
mod test_weights_basic;
