mod bundle_pipeline_tests;
mod init_tests;
mod support;
