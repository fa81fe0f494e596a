//! The fixed built-in question library.
//!
//! Each question is a disaster-oriented decision point: the prompt describes
//! a concrete failure scenario, the options are real engineering trade-offs,
//! and each option carries the risk it accepts. Prompts and options are
//! bilingual (en-US / zh-TW).

use crate::question::{PromptText, Question, QuestionCategory, QuestionOption, RiskTrigger};

/// The fixed question library. Stateless and shared read-only between nodes.
#[derive(Debug, Clone)]
pub struct QuestionLibrary {
    questions: Vec<Question>,
}

impl QuestionLibrary {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The built-in library covering the payment, inventory/concurrency,
    /// authentication, data-consistency, and API-integration scenario
    /// families.
    pub fn builtin() -> Self {
        Self::new(builtin_questions())
    }

    pub fn get(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.get(question_id).is_some()
    }

    pub fn all(&self) -> &[Question] {
        &self.questions
    }
}

impl Default for QuestionLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn option(value: &str, label_en: &str, label_zh: &str, risk_en: &str, risk_zh: &str) -> QuestionOption {
    QuestionOption {
        value: value.into(),
        label: PromptText::new(label_en, label_zh),
        risk_note: PromptText::new(risk_en, risk_zh),
    }
}

fn builtin_questions() -> Vec<Question> {
    vec![
        // --- data integrity -------------------------------------------------
        Question {
            id: "Q-DATA-01".into(),
            category: QuestionCategory::DataIntegrity,
            required: true,
            trigger: RiskTrigger::any_of(&["cache", "consistency", "transaction", "快取", "交易"]),
            prompt: PromptText::new(
                "Database write succeeded but cache update failed — how is consistency guaranteed?",
                "主資料庫寫入成功但快取更新失敗,如何保證一致性?",
            ),
            options: vec![
                option(
                    "rollback",
                    "A. Roll back the database write",
                    "A. 回滾資料庫",
                    "Performance impact on every write",
                    "影響性能",
                ),
                option(
                    "cache_ttl",
                    "B. Bound staleness with a cache TTL",
                    "B. 設定快取過期時間 (TTL)",
                    "Eventual consistency, standard practice",
                    "最終一致性,標準做法",
                ),
                option(
                    "infinite_retry",
                    "C. Retry the cache update until it succeeds",
                    "C. 無限重試",
                    "Possible deadlock under partition",
                    "可能死鎖",
                ),
            ],
        },
        Question {
            id: "Q-DATA-02".into(),
            category: QuestionCategory::DataIntegrity,
            required: true,
            trigger: RiskTrigger::any_of(&["microservice", "message", "queue", "微服務", "訊息"]),
            prompt: PromptText::new(
                "Service A's call to service B failed — how is data loss prevented?",
                "微服務 A 調用微服務 B 失敗,如何保證數據不丟失?",
            ),
            options: vec![
                option(
                    "log_only",
                    "A. Log the failure",
                    "A. 記錄 Log",
                    "Hard to auto-recover",
                    "難以自動恢復",
                ),
                option(
                    "message_queue",
                    "B. Queue the operation and retry",
                    "B. 使用消息隊列重試",
                    "Reliability design, standard practice",
                    "可靠性設計,標準做法",
                ),
                option(
                    "abandon",
                    "C. Abandon the operation",
                    "C. 放棄操作",
                    "Data loss",
                    "數據丟失",
                ),
            ],
        },
        // --- concurrency ----------------------------------------------------
        Question {
            id: "Q-CONC-01".into(),
            category: QuestionCategory::Concurrency,
            required: true,
            trigger: RiskTrigger::any_of(&["concurrent", "order", "併發", "同時", "訂單"]),
            prompt: PromptText::new(
                "Two users buy the last item simultaneously — how is it handled?",
                "兩個用戶同時購買最後一件商品,你要如何處理?",
            ),
            options: vec![
                option(
                    "db_lock",
                    "A. First come first served via a DB lock",
                    "A. 先到先得 (DB Lock)",
                    "Safe but slow",
                    "安全但慢",
                ),
                option(
                    "oversell",
                    "B. Both succeed, restock after overselling",
                    "B. 兩者都成功,超賣後補貨",
                    "Business risk",
                    "商業風險",
                ),
                option(
                    "atomic_ops",
                    "C. Atomic compare-and-swap on the counter",
                    "C. 使用原子操作",
                    "High performance, recommended",
                    "高性能推薦",
                ),
            ],
        },
        // --- security -------------------------------------------------------
        Question {
            id: "Q-SEC-01".into(),
            category: QuestionCategory::Security,
            required: true,
            trigger: RiskTrigger::any_of(&["login", "auth", "password", "user", "登入", "密碼", "用戶"]),
            prompt: PromptText::new(
                "A user fails to log in five times in a row — what happens?",
                "用戶連續登入失敗 5 次,你要如何處理?",
            ),
            options: vec![
                option(
                    "lockout",
                    "A. Lock the account for 30 minutes",
                    "A. 鎖定帳號 30 分鐘",
                    "Standard defense",
                    "標準防禦",
                ),
                option(
                    "captcha",
                    "B. Require a CAPTCHA",
                    "B. 要求圖形驗證碼",
                    "Balanced UX",
                    "平衡體驗",
                ),
                option(
                    "nothing",
                    "C. Do nothing",
                    "C. 不處理",
                    "Brute force risk",
                    "暴力破解風險",
                ),
            ],
        },
        Question {
            id: "Q-SEC-02".into(),
            category: QuestionCategory::Security,
            required: true,
            trigger: RiskTrigger::any_of(&["jwt", "token", "session"]),
            prompt: PromptText::new(
                "A session token is stolen — can the server force it to expire?",
                "JWT Token 被盜用了,服務端能強制讓它失效嗎?",
            ),
            options: vec![
                option(
                    "stateless",
                    "A. No, the token is stateless",
                    "A. 不能,JWT 是無狀態的",
                    "Security vulnerability",
                    "安全漏洞",
                ),
                option(
                    "blacklist",
                    "B. Yes, via a revocation blacklist",
                    "B. 可以,使用黑名單機制",
                    "Standard solution",
                    "標準解決方案",
                ),
                option(
                    "delete_user",
                    "C. Yes, delete the user",
                    "C. 可以,刪除用戶",
                    "Overreaction",
                    "過度反應",
                ),
            ],
        },
        // --- failure handling -----------------------------------------------
        Question {
            id: "Q-FAIL-01".into(),
            category: QuestionCategory::FailureHandling,
            required: true,
            trigger: RiskTrigger::any_of(&["payment", "timeout", "charge", "付款", "支付"]),
            prompt: PromptText::new(
                "The payment API times out after the charge — how do you confirm whether it succeeded?",
                "如果付款 API 在扣款後超時,你要如何確認付款是否成功?",
            ),
            options: vec![
                option(
                    "retry_payment",
                    "A. Retry the payment immediately",
                    "A. 立即重試付款請求",
                    "Duplicate charge risk",
                    "重複扣款風險",
                ),
                option(
                    "status_query",
                    "B. Query the payment status API",
                    "B. 調用查詢付款狀態 API",
                    "Standard practice",
                    "標準做法",
                ),
                option(
                    "manual",
                    "C. Mark pending, handle manually",
                    "C. 標記為待確認,人工處理",
                    "Poor UX",
                    "用戶體驗差",
                ),
            ],
        },
        // --- recovery (others bucket) ----------------------------------------
        Question {
            id: "Q-RECV-01".into(),
            category: QuestionCategory::Recovery,
            required: true,
            trigger: RiskTrigger::any_of(&["payment", "order", "付款", "訂單"]),
            prompt: PromptText::new(
                "Payment succeeded but order creation failed — how is it handled?",
                "用戶付款成功但訂單建立失敗,你要如何處理?",
            ),
            options: vec![
                option(
                    "auto_refund",
                    "A. Automatically refund",
                    "A. 自動退款給用戶",
                    "Lost transaction",
                    "損失交易機會",
                ),
                option(
                    "retry_order",
                    "B. Retry order creation (bounded)",
                    "B. 重試建立訂單 (最多3次)",
                    "Auto recovery",
                    "自動恢復",
                ),
                option(
                    "keep_payment",
                    "C. Keep payment record, allow re-order",
                    "C. 保留付款記錄,允許重新下單",
                    "High support cost",
                    "客服成本高",
                ),
            ],
        },
        // --- state management (advisory) -------------------------------------
        Question {
            id: "Q-STATE-01".into(),
            category: QuestionCategory::StateManagement,
            required: false,
            trigger: RiskTrigger::any_of(&["back", "resubmit", "double", "上一頁"]),
            prompt: PromptText::new(
                "The user navigates back mid-flow — can the operation be submitted twice?",
                "如果用戶在流程中按下「上一頁」,操作會被重複提交嗎?",
            ),
            options: vec![
                option(
                    "duplicate",
                    "A. A duplicate is created",
                    "A. 重複建立",
                    "Dirty data risk",
                    "髒數據風險",
                ),
                option(
                    "state_lock",
                    "B. The flow is locked while in progress",
                    "B. 鎖定流程,提示處理中",
                    "State machine protection",
                    "狀態機保護",
                ),
                option(
                    "no_response",
                    "C. Nothing happens",
                    "C. 無反應",
                    "User confusion",
                    "用戶困惑",
                ),
            ],
        },
        // --- performance (advisory) -------------------------------------------
        Question {
            id: "Q-PERF-01".into(),
            category: QuestionCategory::Performance,
            required: false,
            trigger: RiskTrigger::any_of(&["search", "list", "pagination", "query", "搜尋", "分頁"]),
            prompt: PromptText::new(
                "The listing grows to millions of rows — how is the query kept fast?",
                "列表增長到數百萬筆,如何保持查詢速度?",
            ),
            options: vec![
                option(
                    "offset",
                    "A. Offset pagination",
                    "A. Offset 分頁",
                    "Degrades on deep pages",
                    "深分頁性能差",
                ),
                option(
                    "cursor",
                    "B. Cursor pagination on an indexed key",
                    "B. 游標分頁 (索引鍵)",
                    "Standard for large sets",
                    "大數據集標準做法",
                ),
                option(
                    "load_all",
                    "C. Load everything client-side",
                    "C. 一次載入全部",
                    "Memory blowup",
                    "記憶體爆炸",
                ),
            ],
        },
    ]
}
