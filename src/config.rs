//! Configuration tables and service settings.
//!
//! The category table and reply templates are externally supplied data,
//! loaded once at startup and shared read-only across runs. Both degrade
//! gracefully: a missing file yields the built-in defaults, and the pipeline
//! keeps working even with an empty category table.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Category used when classification finds nothing better.
pub const DEFAULT_CATEGORY: &str = "Personal";

/// Category weight applied when a name is not in the table.
pub const DEFAULT_CATEGORY_WEIGHT: u32 = 10;

/// Upper bound on a single category weight.
const MAX_CATEGORY_WEIGHT: u32 = 30;

// ── Categories ──────────────────────────────────────────────────────

/// One configured message category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    DEFAULT_CATEGORY_WEIGHT
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    categories: Vec<CategoryDef>,
}

/// Ordered, read-only category table.
///
/// Order matters: the classifier fallback picks the first category with a
/// keyword match.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<CategoryDef>,
}

impl CategoryTable {
    pub fn new(categories: Vec<CategoryDef>) -> Self {
        Self { categories }
    }

    /// Empty table — classification degrades to the default category.
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Load from a JSON file, or fall back to the built-in table when no
    /// path is given or the file does not exist. A present-but-invalid file
    /// is a startup error, not something to paper over at analysis time.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let file: CategoryFile =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::new(file.categories))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryDef> {
        self.categories.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category names in configured order, for prompt construction.
    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Importance weight for a category, capped at 30; unknown names get 10.
    pub fn weight_for(&self, name: &str) -> u32 {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.weight.min(MAX_CATEGORY_WEIGHT))
            .unwrap_or(DEFAULT_CATEGORY_WEIGHT)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let def = |name: &str, weight: u32, keywords: &[&str]| CategoryDef {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            weight,
        };
        Self::new(vec![
            def(
                "Work",
                30,
                &[
                    "meeting",
                    "project",
                    "deadline",
                    "report",
                    "presentation",
                    "client",
                    "budget",
                    "approval",
                    "schedule",
                ],
            ),
            def(
                "Financial",
                25,
                &[
                    "invoice",
                    "payment",
                    "bank",
                    "transaction",
                    "bill",
                    "receipt",
                    "statement",
                    "salary",
                ],
            ),
            def(
                "Support",
                20,
                &["ticket", "support", "help desk", "troubleshoot", "password reset"],
            ),
            def(
                "Announcement",
                15,
                &["announcement", "announcing", "introducing", "launch", "release notes"],
            ),
            def(
                "Personal",
                10,
                &["birthday", "family", "dinner", "weekend", "vacation", "party"],
            ),
            def(
                "Newsletter",
                5,
                &["newsletter", "unsubscribe", "subscription", "digest", "weekly roundup"],
            ),
            def(
                "Spam",
                0,
                &[
                    "winner",
                    "lottery",
                    "prize",
                    "claim now",
                    "free money",
                    "limited offer",
                    "act now",
                ],
            ),
        ])
    }
}

// ── Reply templates ─────────────────────────────────────────────────

/// Fallback reply bodies for one category, with `{sender}` and `{subject}`
/// placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyTemplate {
    pub brief: String,
    pub standard: String,
    pub detailed: String,
}

impl ReplyTemplate {
    /// Interpolate sender and subject into all three bodies.
    pub fn render(&self, sender: &str, subject: &str) -> (String, String, String) {
        let fill = |t: &str| t.replace("{sender}", sender).replace("{subject}", subject);
        (fill(&self.brief), fill(&self.standard), fill(&self.detailed))
    }
}

/// Category-keyed reply template table with a generic catch-all.
#[derive(Debug, Clone)]
pub struct ReplyTemplates {
    templates: HashMap<String, ReplyTemplate>,
    generic: ReplyTemplate,
}

impl ReplyTemplates {
    /// Load from a JSON file (object keyed by category name), or fall back
    /// to the built-in templates.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let templates: HashMap<String, ReplyTemplate> = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let mut loaded = Self::default();
        loaded.templates.extend(templates);
        Ok(loaded)
    }

    /// Template for a category, or the generic one when none is configured.
    pub fn for_category(&self, category: &str) -> &ReplyTemplate {
        self.templates.get(category).unwrap_or(&self.generic)
    }
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        let mut templates = HashMap::new();

        templates.insert(
            "Work".to_string(),
            ReplyTemplate {
                brief: "Cảm ơn email về '{subject}'. Tôi đã xem xét nội dung và sẽ thực hiện các bước cần thiết. Nếu có thắc mắc gì, tôi sẽ liên hệ lại ngay.".into(),
                standard: "Kính gửi {sender},\n\nCảm ơn bạn đã gửi email về '{subject}'. Tôi đã nắm được các yêu cầu và sẽ ưu tiên xử lý trong thời gian sớm nhất. Dự kiến hoàn thành trong vòng 1-2 ngày làm việc.\n\nNếu có bất kỳ thông tin bổ sung nào, vui lòng cho tôi biết.\n\nTrân trọng".into(),
                detailed: "Kính gửi {sender},\n\nCảm ơn bạn đã gửi email về '{subject}'.\n\nTôi đã xem xét kỹ các nội dung và yêu cầu trong email. Tôi hiểu đây là vấn đề quan trọng và sẽ ưu tiên xử lý ngay.\n\nKế hoạch của tôi:\n1. Xem xét chi tiết các tài liệu/thông tin liên quan\n2. Thực hiện các hành động cần thiết\n3. Cập nhật tiến độ cho bạn trong vòng 1-2 ngày\n\nNếu có bất kỳ thông tin bổ sung hoặc yêu cầu gấp, đừng ngại liên hệ trực tiếp với tôi.\n\nTrân trọng".into(),
            },
        );

        templates.insert(
            "Personal".to_string(),
            ReplyTemplate {
                brief: "Chào {sender}! Cảm ơn bạn đã nhắn. Về '{subject}', mình đồng ý và sẽ sắp xếp phù hợp. Hẹn sớm gặp lại bạn nhé!".into(),
                standard: "Chào {sender},\n\nCảm ơn bạn đã gửi tin nhắn! Về '{subject}', mình rất vui và sẽ cố gắng sắp xếp thời gian phù hợp.\n\nMình sẽ xác nhận lại với bạn trong thời gian sớm nhất nhé. Nếu có gì thay đổi, mình sẽ báo bạn trước.\n\nHẹn sớm gặp lại!".into(),
                detailed: "Chào {sender},\n\nRất vui khi nhận được tin nhắn của bạn về '{subject}'!\n\nMình đã đọc kỹ nội dung và thấy rất hay. Mình hoàn toàn đồng ý với đề xuất của bạn và sẽ sắp xếp thời gian phù hợp nhất.\n\nMình sẽ kiểm tra lịch trình và xác nhận lại với bạn trong hôm nay hoặc ngày mai. Nếu có bất kỳ thay đổi nào, mình sẽ báo bạn biết trước.\n\nCảm ơn bạn đã nghĩ đến mình. Hẹn sớm gặp lại nhé!".into(),
            },
        );

        templates.insert(
            "Financial".to_string(),
            ReplyTemplate {
                brief: "Đã nhận được thông báo về '{subject}'. Tôi sẽ kiểm tra và thanh toán đúng hạn. Cảm ơn đã nhắc nhở.".into(),
                standard: "Kính gửi,\n\nCảm ơn đã gửi thông báo về '{subject}'.\n\nTôi đã ghi nhận thông tin và sẽ thực hiện thanh toán đúng hạn như yêu cầu. Nếu có bất kỳ vấn đề gì phát sinh, tôi sẽ liên hệ trực tiếp.\n\nTrân trọng".into(),
                detailed: "Kính gửi,\n\nCảm ơn đã gửi thông báo về '{subject}'.\n\nTôi đã nhận được và ghi nhận đầy đủ các thông tin:\n- Số tiền cần thanh toán\n- Thời hạn thanh toán\n- Phương thức thanh toán\n\nTôi sẽ thực hiện thanh toán đúng hạn qua phương thức đã đăng ký. Nếu có bất kỳ thay đổi hoặc vấn đề gì phát sinh, tôi sẽ liên hệ trực tiếp với bộ phận hỗ trợ.\n\nTrân trọng".into(),
            },
        );

        templates.insert(
            "Support".to_string(),
            ReplyTemplate {
                brief: "Cảm ơn đã hỗ trợ về '{subject}'. Thông tin rất hữu ích. Nếu cần thêm hỗ trợ, tôi sẽ liên hệ lại.".into(),
                standard: "Xin chào,\n\nCảm ơn đội ngũ hỗ trợ đã gửi thông tin về '{subject}'.\n\nThông tin bạn cung cấp rất hữu ích và giúp tôi giải quyết được vấn đề. Nếu có bất kỳ thắc mắc gì thêm, tôi sẽ liên hệ lại.\n\nCảm ơn sự hỗ trợ nhiệt tình!".into(),
                detailed: "Xin chào,\n\nCảm ơn đội ngũ hỗ trợ đã gửi thông tin chi tiết về '{subject}'.\n\nTôi đã đọc kỹ hướng dẫn và thông tin bạn cung cấp. Các bước giải quyết rất rõ ràng và giúp tôi hiểu rõ hơn về vấn đề đang gặp phải.\n\nTôi sẽ thực hiện theo hướng dẫn và theo dõi tình hình. Nếu vấn đề vẫn còn hoặc có thắc mắc gì thêm, tôi sẽ liên hệ lại với đội hỗ trợ.\n\nCảm ơn sự hỗ trợ nhiệt tình và chuyên nghiệp!".into(),
            },
        );

        // Newsletters and announcements rarely need more than a short note.
        let bulletin = ReplyTemplate {
            brief: "Cảm ơn đã chia sẻ thông tin về '{subject}'. Nội dung rất hữu ích và thú vị!".into(),
            standard: "Xin chào,\n\nCảm ơn đã gửi thông tin về '{subject}'.\n\nNội dung rất hữu ích và cập nhật. Tôi đánh giá cao việc được nhận những thông tin chất lượng như vậy.\n\nMong được tiếp tục nhận những bản tin trong tương lai!".into(),
            detailed: "Xin chào,\n\nCảm ơn đã gửi thông tin về '{subject}'.\n\nNội dung rất hữu ích và cập nhật. Tôi đánh giá cao việc được nhận những thông tin chất lượng như vậy.\n\nMong được tiếp tục nhận những bản tin trong tương lai!".into(),
        };
        templates.insert("Newsletter".to_string(), bulletin.clone());
        templates.insert("Announcement".to_string(), bulletin);

        let generic = ReplyTemplate {
            brief: "Đã nhận được email về '{subject}'. Cảm ơn.".into(),
            standard: "Xin chào,\n\nĐã nhận được email của bạn về '{subject}'.\n\nCảm ơn đã gửi thông tin. Nếu có nội dung liên quan đến tôi, tôi sẽ xem xét và phản hồi khi cần thiết.\n\nTrân trọng".into(),
            detailed: "Xin chào,\n\nĐã nhận được email của bạn về '{subject}'.\n\nCảm ơn đã gửi thông tin. Nếu có nội dung liên quan đến tôi, tôi sẽ xem xét và phản hồi khi cần thiết.\n\nTrân trọng".into(),
        };

        Self { templates, generic }
    }
}

// ── Generative service ──────────────────────────────────────────────

/// Settings for the generative text service client.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    pub model: String,
    pub api_key: SecretString,
    /// Per-request timeout; expiry counts as service-unavailable.
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            api_key,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_table_weights() {
        let table = CategoryTable::default();
        assert_eq!(table.weight_for("Work"), 30);
        assert_eq!(table.weight_for("Financial"), 25);
        assert_eq!(table.weight_for("Newsletter"), 5);
        assert_eq!(table.weight_for("Spam"), 0);
        assert_eq!(table.weight_for("SomethingElse"), 10);
    }

    #[test]
    fn weight_is_capped() {
        let table = CategoryTable::new(vec![CategoryDef {
            name: "Oversized".into(),
            keywords: vec![],
            weight: 90,
        }]);
        assert_eq!(table.weight_for("Oversized"), 30);
    }

    #[test]
    fn empty_table_reports_defaults() {
        let table = CategoryTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.weight_for("Work"), 10);
        assert!(table.names().is_empty());
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let table =
            CategoryTable::load_or_default(Some(Path::new("/nonexistent/categories.json")))
                .unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.weight_for("Work"), 30);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"categories": [{{"name": "Ops", "keywords": ["incident"], "weight": 28}}]}}"#
        )
        .unwrap();
        let table = CategoryTable::load_or_default(Some(file.path())).unwrap();
        assert_eq!(table.names(), vec!["Ops"]);
        assert_eq!(table.weight_for("Ops"), 28);
    }

    #[test]
    fn load_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let result = CategoryTable::load_or_default(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn template_render_interpolates() {
        let templates = ReplyTemplates::default();
        let (brief, standard, _) = templates
            .for_category("Work")
            .render("Minh", "Báo cáo quý 4");
        assert!(brief.contains("Báo cáo quý 4"));
        assert!(standard.contains("Minh"));
        assert!(!standard.contains("{sender}"));
    }

    #[test]
    fn unknown_category_gets_generic_template() {
        let templates = ReplyTemplates::default();
        let template = templates.for_category("Spam");
        assert!(template.brief.contains("{subject}"));
        let (brief, _, _) = template.render("x", "quảng cáo");
        assert!(brief.contains("quảng cáo"));
    }

    #[test]
    fn custom_templates_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Work": {{"brief": "b {{subject}}", "standard": "s", "detailed": "d"}}}}"#
        )
        .unwrap();
        let templates = ReplyTemplates::load_or_default(Some(file.path())).unwrap();
        assert_eq!(templates.for_category("Work").standard, "s");
        // Unmodified categories keep their defaults.
        assert!(templates.for_category("Personal").brief.contains("Chào"));
    }
}
