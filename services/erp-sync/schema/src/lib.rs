pub mod erp_outbox;
