// ==========================================
// 商品主码系统 - 文本规范化原语
// ==========================================
// 职责: 空白折叠 / 保序去重 / 选项值规范形
// 约束: 纯函数、全函数，无 IO 无状态
// ==========================================

/// 折叠连续空白为单个空格，并去除首尾空白
///
/// 空白判定使用 Unicode 口径（char::is_whitespace），
/// 全角空格、制表符等一并折叠。
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 选项值规范形: uppercase(normalize_whitespace(s))
///
/// 幂等: canonicalize(canonicalize(s)) == canonicalize(s)
pub fn canonicalize_option_value(s: &str) -> String {
    normalize_whitespace(s).to_uppercase()
}

/// 保序去重（按值精确匹配，保留首次出现）
pub fn dedupe_preserve_order(list: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    list.into_iter().filter(|v| seen.insert(v.clone())).collect()
}
