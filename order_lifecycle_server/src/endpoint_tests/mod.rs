mod mocks;
mod orders;
mod storage_errors;
mod webhooks;
