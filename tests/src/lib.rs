mod offload_core_tests;
mod offload_tests;
