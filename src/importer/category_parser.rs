// ==========================================
// 商品主码系统 - 类目串解析器
// ==========================================
// 职责: 原始类目串 → 有序、去重、非空的类目 id 列表
// 约定: 首个类目为发码类目（后续序号分配的归属类目）
// ==========================================

use crate::importer::canonicalizer::{dedupe_preserve_order, normalize_whitespace};
use crate::importer::error::{ImportError, ImportResult};

/// 解析类目串
///
/// 规则:
/// 1. 字段缺失 → CategoryMissing
/// 2. 按逗号切分，逐 token 空白归一，丢弃空 token
/// 3. 保序去重（精确匹配）
/// 4. 结果为空（全是空白/逗号）→ CategoryEmpty
///
/// 示例: " CATE9 , CATE44, CATE9 ,CATE55 " → ["CATE9","CATE44","CATE55"]
pub fn parse_category_ids(raw: Option<&str>) -> ImportResult<Vec<String>> {
    let raw = raw.ok_or(ImportError::CategoryMissing)?;

    let tokens: Vec<String> = raw
        .split(',')
        .map(normalize_whitespace)
        .filter(|t| !t.is_empty())
        .collect();

    let ids = dedupe_preserve_order(tokens);
    if ids.is_empty() {
        return Err(ImportError::CategoryEmpty(raw.to_string()));
    }

    Ok(ids)
}
