pub mod origin_policy;
