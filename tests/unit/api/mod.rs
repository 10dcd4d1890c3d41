pub mod test_app_state;
