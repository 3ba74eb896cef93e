pub(crate) mod call_llm;
pub(crate) mod file_list;
pub(crate) mod read_file;
