pub mod json_dir_store;
