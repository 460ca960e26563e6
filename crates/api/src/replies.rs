//! User-facing reply texts sent back through LINE.

/// Text messages that ask for usage instructions.
pub const HELP_TRIGGERS: [&str; 2] = ["help", "說明"];

/// Reply texts, parameterized by the account-binding page.
#[derive(Debug, Clone)]
pub struct ReplyCatalog {
    bind_url: String,
}

impl ReplyCatalog {
    pub fn new(bind_url: impl Into<String>) -> Self {
        Self {
            bind_url: bind_url.into(),
        }
    }

    /// Exact, case-sensitive match.
    pub fn is_help_trigger(text: &str) -> bool {
        HELP_TRIGGERS.contains(&text)
    }

    pub fn usage(&self) -> String {
        "請上傳 CSV 檔案以更新帳本。上傳後將會覆蓋現有資料。".to_string()
    }

    pub fn binding_instructions(&self) -> String {
        format!("尚未綁定帳號。請點擊以下連結進行綁定：\n{}", self.bind_url)
    }

    pub fn download_failed(&self) -> String {
        "讀取檔案失敗。".to_string()
    }

    pub fn parse_failed(&self, detail: &str) -> String {
        format!("CSV 解析失敗: {}", detail)
    }

    pub fn save_failed(&self) -> String {
        "儲存失敗。".to_string()
    }

    pub fn imported(&self, count: usize) -> String {
        format!("已成功更新 {} 筆交易紀錄。", count)
    }

    pub fn system_error(&self) -> String {
        "系統錯誤，請稍後再試。".to_string()
    }
}
