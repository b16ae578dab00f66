// ==========================================
// 商品主码系统 - 行校验流水线
// ==========================================
// 状态机: RAW → PARSED → VALID-INTENT，任一步失败则产出带类型码的行错误
// 红线: 行结果用标签枚举表达（Valid/Invalid），批次循环做模式匹配，
//       不依赖跨整批的异常展开控制流
// ==========================================

use crate::domain::{OptionValueIntent, ProductIntent, RowError, RowErrorCode, RowWarning};
use crate::importer::canonicalizer::{canonicalize_option_value, normalize_whitespace};
use crate::importer::category_parser::parse_category_ids;
use crate::importer::field_layout::*;
use crate::importer::product_importer_trait::RowValidator as RowValidatorTrait;
use std::collections::{HashMap, HashSet};

/// 单行校验结果
#[derive(Debug, Clone)]
pub enum RowValidation {
    /// 校验通过: 落库意图 + 行级警告
    Valid {
        intent: ProductIntent,
        warnings: Vec<RowWarning>,
    },
    /// 校验失败: 该行不落库，批次继续
    Invalid(RowError),
}

/// Y/N 标志解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YnFlag {
    Yes,
    No,
    /// 非空但既不是 Y 也不是 N
    Invalid,
}

fn parse_yn(raw: &str) -> YnFlag {
    match raw.trim().to_uppercase().as_str() {
        "Y" => YnFlag::Yes,
        "N" => YnFlag::No,
        _ => YnFlag::Invalid,
    }
}

pub struct RowValidator;

impl RowValidator {
    /// 读取单元格，空白视同缺失（外部导出常以空串表示"无此值"）
    fn cell<'a>(row: &'a HashMap<String, String>, col: &str) -> Option<&'a str> {
        row.get(col)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// 解析销售价: 去除千分位分隔符后必须是有限的非负整数
    ///
    /// 接受 "12000" / "12,000" / "12000.0"（小数部分为零），
    /// 拒绝负数、非数值、NaN/Inf、非整数小数
    fn parse_price(raw: &str) -> Option<i64> {
        let cleaned: String = raw.trim().replace(',', "");
        if cleaned.is_empty() {
            return None;
        }

        if let Ok(v) = cleaned.parse::<i64>() {
            return (v >= 0).then_some(v);
        }

        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 && v >= 0.0 && v <= i64::MAX as f64 => {
                Some(v as i64)
            }
            _ => None,
        }
    }

    /// 解析库存数量（非负整数，解析失败视同该来源缺失）
    fn parse_qty(raw: &str) -> Option<i64> {
        let cleaned: String = raw.trim().replace(',', "");
        cleaned.parse::<i64>().ok().filter(|v| *v >= 0)
    }
}

impl RowValidatorTrait for RowValidator {
    /// 校验单行并产出落库意图
    ///
    /// # 参数
    /// - row: 列名 → 原始单元格值
    /// - row_number: 报告行号（1 起算，含表头行，首个数据行为 2）
    fn validate_row(&self, row: &HashMap<String, String>, row_number: usize) -> RowValidation {
        let mut warnings = Vec::new();

        let invalid = |code: RowErrorCode, message: String| {
            RowValidation::Invalid(RowError {
                row_number,
                message,
                code,
            })
        };

        // ===== 必填字段: 商品号 / 商品名 =====
        let external_id = match Self::cell(row, COL_PRODUCT_ID) {
            Some(v) => normalize_whitespace(v),
            None => {
                return invalid(
                    RowErrorCode::ProductId,
                    format!("商品号缺失（列 {}）", COL_PRODUCT_ID),
                )
            }
        };

        let name = match Self::cell(row, COL_PRODUCT_NAME) {
            Some(v) => normalize_whitespace(v),
            None => {
                return invalid(
                    RowErrorCode::ProductName,
                    format!("商品名缺失（列 {}）", COL_PRODUCT_NAME),
                )
            }
        };

        // ===== 类目: 首个为发码类目 =====
        let category_ids = match parse_category_ids(Self::cell(row, COL_CATEGORY_IDS)) {
            Ok(ids) => ids,
            Err(e) => return invalid(RowErrorCode::Category, format!("类目解析失败: {}", e)),
        };
        let issued_category_id = category_ids[0].clone();

        // ===== 销售价 =====
        let price_sale = match Self::cell(row, COL_PRICE_SALE).and_then(Self::parse_price) {
            Some(v) => v,
            None => {
                return invalid(
                    RowErrorCode::Price,
                    format!(
                        "销售价无效: {:?}（需为非负整数）",
                        row.get(COL_PRICE_SALE).map(|s| s.as_str()).unwrap_or("")
                    ),
                )
            }
        };

        // ===== 库存跟踪与库存一致性 =====
        let inventory_track = match Self::cell(row, COL_INVENTORY_TRACK) {
            None => false,
            Some(v) => match parse_yn(v) {
                YnFlag::Yes => true,
                YnFlag::No => false,
                YnFlag::Invalid => {
                    // 非 Y/N 值按 N 处理，记录警告（不是错误）
                    warnings.push(RowWarning {
                        row_number,
                        message: format!("库存跟踪标志无效: {:?}，按 N 处理", v.trim()),
                    });
                    false
                }
            },
        };

        let stock_primary = Self::cell(row, COL_STOCK_QTY);
        let stock_secondary = Self::cell(row, COL_STOCK_QTY_TOTAL);

        // 不跟踪库存却带有库存类字段 → 上游数据冲突，行级硬失败
        if !inventory_track && (stock_primary.is_some() || stock_secondary.is_some()) {
            return invalid(
                RowErrorCode::InventoryMismatch,
                "库存跟踪为 N 但存在库存数量字段，信号冲突".to_string(),
            );
        }

        let stock_qty = if inventory_track {
            // 主字段 → 次级聚合字段 → 空 + 警告
            let qty = stock_primary
                .and_then(Self::parse_qty)
                .or_else(|| stock_secondary.and_then(Self::parse_qty));
            if qty.is_none() {
                warnings.push(RowWarning {
                    row_number,
                    message: "库存跟踪为 Y 但无法解析库存数量，记为空".to_string(),
                });
            }
            qty
        } else {
            None
        };

        // ===== 展示标志（缺失/无效一律按隐藏处理）=====
        let display_status = matches!(
            Self::cell(row, COL_DISPLAY_STATUS).map(parse_yn),
            Some(YnFlag::Yes)
        );

        // ===== 选项一致性 =====
        let option_used = matches!(
            Self::cell(row, COL_OPTION_USED).map(parse_yn),
            Some(YnFlag::Yes)
        );

        let (option_name, option_values) = if option_used {
            match Self::cell(row, COL_OPTION_NAME).map(normalize_whitespace) {
                // 选项名缺失: 警告并跳过整个选项块（不是错误）
                None => {
                    warnings.push(RowWarning {
                        row_number,
                        message: "使用选项但选项名缺失，跳过选项".to_string(),
                    });
                    (None, Vec::new())
                }
                Some(opt_name) => match Self::cell(row, COL_OPTION_VALUES) {
                    // 有选项名却无选项值: 行级硬失败
                    None => {
                        return invalid(
                            RowErrorCode::OptionValues,
                            format!("选项 {:?} 缺少选项值", opt_name),
                        )
                    }
                    Some(values_raw) => {
                        // 逗号切分 → 空白归一 → 按 canonical 去重（保留首次出现）
                        let mut seen = HashSet::new();
                        let mut values = Vec::new();
                        for token in values_raw.split(',') {
                            let display = normalize_whitespace(token);
                            if display.is_empty() {
                                continue;
                            }
                            let canonical = canonicalize_option_value(&display);
                            if seen.insert(canonical.clone()) {
                                values.push(OptionValueIntent {
                                    display_value: display,
                                    canonical_value: canonical,
                                });
                            }
                        }

                        if values.is_empty() {
                            return invalid(
                                RowErrorCode::OptionValues,
                                format!("选项 {:?} 的选项值过滤后为空", opt_name),
                            );
                        }

                        (Some(opt_name), values)
                    }
                },
            }
        } else {
            (None, Vec::new())
        };

        // ===== 透传字段 =====
        let sale_status = Self::cell(row, COL_SALE_STATUS).map(normalize_whitespace);
        let description = Self::cell(row, COL_DESCRIPTION).map(|v| v.trim().to_string());
        let thumbnail_url = Self::cell(row, COL_THUMBNAIL_URL).map(|v| v.trim().to_string());
        let external_url = Self::cell(row, COL_PRODUCT_URL).map(|v| v.trim().to_string());

        // 原始行逐字快照（审计存储）
        let raw_row = serde_json::to_value(row).unwrap_or(serde_json::Value::Null);

        RowValidation::Valid {
            intent: ProductIntent {
                row_number,
                external_id,
                name,
                category_ids,
                issued_category_id,
                price_sale,
                inventory_track,
                stock_qty,
                sale_status,
                display_status,
                description,
                option_name,
                option_values,
                thumbnail_url,
                external_url,
                raw_row,
            },
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_row() -> HashMap<String, String> {
        let mut row = HashMap::new();
        row.insert(COL_PRODUCT_ID.to_string(), "1001".to_string());
        row.insert(COL_PRODUCT_NAME.to_string(), "运动水壶 500ml".to_string());
        row.insert(COL_CATEGORY_IDS.to_string(), "CATE9,CATE44".to_string());
        row.insert(COL_PRICE_SALE.to_string(), "12,000".to_string());
        row
    }

    fn expect_valid(v: RowValidation) -> (ProductIntent, Vec<RowWarning>) {
        match v {
            RowValidation::Valid { intent, warnings } => (intent, warnings),
            RowValidation::Invalid(e) => panic!("expected valid row, got {:?}", e),
        }
    }

    fn expect_invalid(v: RowValidation) -> RowError {
        match v {
            RowValidation::Invalid(e) => e,
            RowValidation::Valid { intent, .. } => {
                panic!("expected invalid row, got intent for {}", intent.external_id)
            }
        }
    }

    #[test]
    fn test_valid_minimal_row() {
        let (intent, warnings) = expect_valid(RowValidator.validate_row(&base_row(), 2));

        assert_eq!(intent.external_id, "1001");
        assert_eq!(intent.name, "运动水壶 500ml");
        assert_eq!(intent.category_ids, vec!["CATE9", "CATE44"]);
        assert_eq!(intent.issued_category_id, "CATE9");
        assert_eq!(intent.price_sale, 12000);
        assert!(!intent.inventory_track);
        assert_eq!(intent.stock_qty, None);
        assert!(!intent.display_status);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_product_id() {
        let mut row = base_row();
        row.insert(COL_PRODUCT_ID.to_string(), "   ".to_string());
        let err = expect_invalid(RowValidator.validate_row(&row, 3));
        assert_eq!(err.code, RowErrorCode::ProductId);
        assert_eq!(err.row_number, 3);
    }

    #[test]
    fn test_missing_name() {
        let mut row = base_row();
        row.remove(COL_PRODUCT_NAME);
        let err = expect_invalid(RowValidator.validate_row(&row, 2));
        assert_eq!(err.code, RowErrorCode::ProductName);
    }

    #[test]
    fn test_bad_category_string() {
        let mut row = base_row();
        row.insert(COL_CATEGORY_IDS.to_string(), " , ,, ".to_string());
        let err = expect_invalid(RowValidator.validate_row(&row, 2));
        assert_eq!(err.code, RowErrorCode::Category);
    }

    #[test]
    fn test_price_with_thousands_separator() {
        let mut row = base_row();
        row.insert(COL_PRICE_SALE.to_string(), "1,234,500".to_string());
        let (intent, _) = expect_valid(RowValidator.validate_row(&row, 2));
        assert_eq!(intent.price_sale, 1_234_500);
    }

    #[test]
    fn test_negative_or_fractional_price_rejected() {
        for bad in ["-1", "12.5", "abc", ""] {
            let mut row = base_row();
            row.insert(COL_PRICE_SALE.to_string(), bad.to_string());
            let err = expect_invalid(RowValidator.validate_row(&row, 2));
            assert_eq!(err.code, RowErrorCode::Price, "price {:?}", bad);
        }
    }

    #[test]
    fn test_invalid_inventory_flag_warns_and_defaults_to_n() {
        let mut row = base_row();
        row.insert(COL_INVENTORY_TRACK.to_string(), "X".to_string());
        let (intent, warnings) = expect_valid(RowValidator.validate_row(&row, 2));
        assert!(!intent.inventory_track);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("库存跟踪标志无效"));
    }

    #[test]
    fn test_inventory_mismatch_is_hard_stop() {
        // 不跟踪库存却带库存字段 → 冲突信号，行级硬失败
        let mut row = base_row();
        row.insert(COL_INVENTORY_TRACK.to_string(), "N".to_string());
        row.insert(COL_STOCK_QTY.to_string(), "15".to_string());
        let err = expect_invalid(RowValidator.validate_row(&row, 2));
        assert_eq!(err.code, RowErrorCode::InventoryMismatch);
    }

    #[test]
    fn test_inventory_qty_fallback_to_secondary() {
        let mut row = base_row();
        row.insert(COL_INVENTORY_TRACK.to_string(), "Y".to_string());
        row.insert(COL_STOCK_QTY_TOTAL.to_string(), "42".to_string());
        let (intent, warnings) = expect_valid(RowValidator.validate_row(&row, 2));
        assert!(intent.inventory_track);
        assert_eq!(intent.stock_qty, Some(42));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_inventory_qty_unresolvable_warns_null() {
        let mut row = base_row();
        row.insert(COL_INVENTORY_TRACK.to_string(), "Y".to_string());
        let (intent, warnings) = expect_valid(RowValidator.validate_row(&row, 2));
        assert!(intent.inventory_track);
        assert_eq!(intent.stock_qty, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("记为空"));
    }

    #[test]
    fn test_option_name_missing_warns_and_skips_block() {
        let mut row = base_row();
        row.insert(COL_OPTION_USED.to_string(), "Y".to_string());
        row.insert(COL_OPTION_VALUES.to_string(), "Red,Blue".to_string());
        let (intent, warnings) = expect_valid(RowValidator.validate_row(&row, 2));
        assert_eq!(intent.option_name, None);
        assert!(intent.option_values.is_empty());
        assert!(warnings.iter().any(|w| w.message.contains("选项名缺失")));
    }

    #[test]
    fn test_option_values_missing_is_hard_stop() {
        let mut row = base_row();
        row.insert(COL_OPTION_USED.to_string(), "Y".to_string());
        row.insert(COL_OPTION_NAME.to_string(), "颜色".to_string());
        let err = expect_invalid(RowValidator.validate_row(&row, 2));
        assert_eq!(err.code, RowErrorCode::OptionValues);
    }

    #[test]
    fn test_option_values_canonical_dedupe_first_wins() {
        let mut row = base_row();
        row.insert(COL_OPTION_USED.to_string(), "Y".to_string());
        row.insert(COL_OPTION_NAME.to_string(), "member".to_string());
        row.insert(
            COL_OPTION_VALUES.to_string(),
            "  Ka ri na  ver.1 , KA RI NA VER.1, Winter ".to_string(),
        );
        let (intent, _) = expect_valid(RowValidator.validate_row(&row, 2));

        assert_eq!(intent.option_name.as_deref(), Some("member"));
        assert_eq!(
            intent.option_values,
            vec![
                OptionValueIntent {
                    display_value: "Ka ri na ver.1".to_string(),
                    canonical_value: "KA RI NA VER.1".to_string(),
                },
                OptionValueIntent {
                    display_value: "Winter".to_string(),
                    canonical_value: "WINTER".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_option_values_all_blank_is_hard_stop() {
        let mut row = base_row();
        row.insert(COL_OPTION_USED.to_string(), "Y".to_string());
        row.insert(COL_OPTION_NAME.to_string(), "颜色".to_string());
        row.insert(COL_OPTION_VALUES.to_string(), " , ,  ".to_string());
        let err = expect_invalid(RowValidator.validate_row(&row, 2));
        assert_eq!(err.code, RowErrorCode::OptionValues);
    }

    #[test]
    fn test_raw_row_snapshot_is_verbatim() {
        let mut row = base_row();
        row.insert(COL_OPTION_VALUES.to_string(), "  Red , Blue ".to_string());
        let (intent, _) = expect_valid(RowValidator.validate_row(&row, 2));
        assert_eq!(intent.raw_row[COL_OPTION_VALUES], "  Red , Blue ");
    }
}
