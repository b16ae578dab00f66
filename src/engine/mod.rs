// ==========================================
// 商品主码系统 - 引擎层
// ==========================================
// 职责: 业务规则（发码），仓储层只做 CRUD
// ==========================================

pub mod code_issuer;

pub use code_issuer::{format_master_code, issue, IssuedCode, MAX_SEQUENCE};
