//! Weekly fine-dust forecast response model
//!
//! 에어코리아 `getMinuDustWeekFrcstDspth` 응답을 해석해
//! 사람이 읽을 수 있는 문자열로 변환합니다.

use std::fmt;

use serde_json::Value;

/// Placeholder for a missing forecast field
const MISSING: &str = "정보 없음";

/// Placeholder for a missing announcement date in the date listing
const MISSING_DATE: &str = "날짜 정보 없음";

/// Message returned when the upstream has no forecast for the date
pub const NO_DATA_MESSAGE: &str = "해당 날짜에 대한 미세먼지 주간예보 데이터가 없습니다.";

/// (date field, content field) for each day offset, in order
const DAY_FIELDS: [(&str, &str); 4] = [
    ("frcstOneDt", "frcstOneCn"),
    ("frcstTwoDt", "frcstTwoCn"),
    ("frcstThreeDt", "frcstThreeCn"),
    ("frcstFourDt", "frcstFourCn"),
];

/// Render a JSON node as text. Missing and null nodes take `default`,
/// scalars render as their JSON text and containers render empty.
fn node_text(node: Option<&Value>, default: &str) -> String {
    match node {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(_) | Value::Object(_)) => String::new(),
    }
}

/// Header fields: an explicit JSON null reads as `null`, a missing one as empty.
fn header_text(node: Option<&Value>) -> String {
    match node {
        Some(Value::Null) => "null".to_string(),
        other => node_text(other, ""),
    }
}

/// Lenient integer read: numbers, numeric strings and booleans count.
fn node_int(node: Option<&Value>) -> i64 {
    match node {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

/// Child values of `items`, whether it is an array or an object.
fn elements(items: &Value) -> Vec<&Value> {
    match items {
        Value::Array(values) => values.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

/// Forecast for one day offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayForecast {
    pub date: String,
    pub content: String,
}

/// One forecast item, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyForecast {
    /// 발표일 (`presnatnDt`)
    pub announced_at: String,
    /// 예보문 (`gwthcnd`)
    pub outlook: String,
    /// 1일 후 ~ 4일 후 예보
    pub days: [DayForecast; 4],
}

impl WeeklyForecast {
    /// Whether an item carries forecast text (`gwthcnd` or `frcstOneCn` key)
    pub fn has_forecast(item: &Value) -> bool {
        item.get("gwthcnd").is_some() || item.get("frcstOneCn").is_some()
    }

    /// Build from a raw item; missing fields become `정보 없음`.
    pub fn from_item(item: &Value) -> Self {
        let days = DAY_FIELDS.map(|(date, content)| DayForecast {
            date: node_text(item.get(date), MISSING),
            content: node_text(item.get(content), MISSING),
        });

        Self {
            announced_at: node_text(item.get("presnatnDt"), MISSING),
            outlook: node_text(item.get("gwthcnd"), MISSING),
            days,
        }
    }
}

impl fmt::Display for WeeklyForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📅 발표일: {}", self.announced_at)?;
        writeln!(f)?;
        writeln!(f, "🔹 예보문: {}", self.outlook)?;
        writeln!(f)?;
        for (i, day) in self.days.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}일 후 예보 - {}]", i + 1, day.date)?;
            writeln!(f, "{}", day.content)?;
        }
        Ok(())
    }
}

/// `response.header` of the upstream envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiHeader {
    pub result_code: String,
    pub result_msg: String,
}

impl ApiHeader {
    fn from_response(response: Option<&Value>) -> Self {
        let header = response.and_then(|r| r.get("header"));
        Self {
            result_code: header_text(header.and_then(|h| h.get("resultCode"))),
            result_msg: header_text(header.and_then(|h| h.get("resultMsg"))),
        }
    }

    /// `00`, or a message mentioning NORMAL / 정상, counts as success.
    pub fn is_success(&self) -> bool {
        self.result_code == "00"
            || self.result_msg.contains("NORMAL")
            || self.result_msg.contains("정상")
    }
}

/// Every way a forecast lookup can end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastOutcome {
    /// The request never produced a response
    RequestFailed(String),
    /// The body is not JSON (HTML error page, plain-text auth error, ...)
    NotJson { body: String },
    /// HTTP status >= 400 with a JSON-looking body
    HttpError { status: u16, body: String },
    /// The body looked like JSON but did not parse
    MalformedJson(String),
    /// The upstream reported a non-success result code
    ApiError { message: String },
    MissingBody,
    MissingItems,
    /// A forecast was found
    Report(WeeklyForecast),
    /// No forecast and nothing else to list
    NoData,
    /// No forecast, but these announcement dates exist
    AvailableDates(Vec<String>),
}

impl ForecastOutcome {
    /// Classify a raw upstream response.
    pub fn from_response(status: u16, body: &str) -> Self {
        // The body is read line by line and joined without separators.
        let body: String = body.lines().collect();
        let body = body.as_str();
        let trimmed = body.trim();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Self::NotJson {
                body: trimmed.to_string(),
            };
        }

        if status >= 400 {
            return Self::HttpError {
                status,
                body: body.to_string(),
            };
        }

        let root: Value = match serde_json::from_str(body) {
            Ok(root) => root,
            Err(e) => return Self::MalformedJson(e.to_string()),
        };

        let response = root.get("response");
        let header = ApiHeader::from_response(response);
        tracing::info!(
            result_code = %header.result_code,
            result_msg = %header.result_msg,
            "Upstream result"
        );
        if !header.is_success() {
            return Self::ApiError {
                message: header.result_msg,
            };
        }

        let body = match response.and_then(|r| r.get("body")) {
            None | Some(Value::Null) => return Self::MissingBody,
            Some(body) => body,
        };

        let items = match body.get("items") {
            None | Some(Value::Null) => return Self::MissingItems,
            Some(items) => items,
        };

        if let Some(first) = items.as_array().and_then(|a| a.first()) {
            if WeeklyForecast::has_forecast(first) {
                return Self::Report(WeeklyForecast::from_item(first));
            }
        }

        let entries = elements(items);
        if node_int(body.get("totalCount")) == 0 || entries.is_empty() {
            return Self::NoData;
        }

        Self::AvailableDates(
            entries
                .into_iter()
                .map(|item| node_text(item.get("presnatnDt"), MISSING_DATE))
                .collect(),
        )
    }

    /// Whether the caller should treat this outcome as a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_)
                | Self::NotJson { .. }
                | Self::HttpError { .. }
                | Self::MalformedJson(_)
                | Self::ApiError { .. }
        )
    }
}

impl fmt::Display for ForecastOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed(detail) => {
                write!(f, "API 호출 중 오류가 발생했습니다: {}", detail)
            }
            Self::NotJson { body } => write!(
                f,
                "API에서 JSON이 아닌 응답을 반환했습니다. (예: 인증 오류, 서버 오류 등)\n응답 내용: {}",
                body
            ),
            Self::HttpError { status, body } => {
                write!(f, "API 오류 응답 (코드: {}): {}", status, body)
            }
            Self::MalformedJson(detail) => {
                write!(f, "JSON 처리 중 오류가 발생했습니다: {}", detail)
            }
            Self::ApiError { message } => write!(f, "API 오류: {}", message),
            Self::MissingBody => f.write_str("API 응답에 body 정보가 없습니다."),
            Self::MissingItems => f.write_str("API 응답에 items 정보가 없습니다."),
            Self::Report(forecast) => fmt::Display::fmt(forecast, f),
            Self::NoData => f.write_str(NO_DATA_MESSAGE),
            Self::AvailableDates(dates) => {
                writeln!(f, "{}", NO_DATA_MESSAGE)?;
                writeln!(f, "[조회 가능 날짜 목록]")?;
                for date in dates {
                    writeln!(f, "- {}", date)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(body: Value) -> String {
        json!({
            "response": {
                "header": {"resultCode": "00", "resultMsg": "NORMAL_CODE"},
                "body": body
            }
        })
        .to_string()
    }

    fn sample_item() -> Value {
        json!({
            "presnatnDt": "2024-01-01",
            "gwthcnd": "대기 정체로 농도가 높겠습니다.",
            "frcstOneDt": "2024-01-02",
            "frcstOneCn": "서울 : 높음, 부산 : 낮음",
            "frcstTwoDt": "2024-01-03",
            "frcstTwoCn": "서울 : 낮음",
            "frcstThreeDt": "2024-01-04",
            "frcstThreeCn": "서울 : 높음",
            "frcstFourDt": "2024-01-05",
            "frcstFourCn": "서울 : 낮음"
        })
    }

    #[test]
    fn test_not_json_body() {
        let outcome = ForecastOutcome::from_response(200, "  <html>SERVICE KEY IS NOT REGISTERED</html>\n");
        assert!(outcome.is_error());
        let text = outcome.to_string();
        assert!(text.contains("JSON이 아닌"));
        assert!(text.ends_with("응답 내용: <html>SERVICE KEY IS NOT REGISTERED</html>"));
    }

    #[test]
    fn test_not_json_body_lines_joined() {
        let outcome = ForecastOutcome::from_response(200, "<html>\n<body>err</body>\r\n</html>\n");
        let text = outcome.to_string();
        assert!(text.ends_with("응답 내용: <html><body>err</body></html>"));
    }

    #[test]
    fn test_http_error_body_lines_joined() {
        let outcome = ForecastOutcome::from_response(502, "{\"error\":\n\"bad gateway\"}\n");
        assert_eq!(
            outcome,
            ForecastOutcome::HttpError {
                status: 502,
                body: "{\"error\":\"bad gateway\"}".to_string(),
            }
        );
    }

    #[test]
    fn test_not_json_wins_over_status() {
        let outcome = ForecastOutcome::from_response(500, "Internal Server Error");
        assert!(matches!(outcome, ForecastOutcome::NotJson { .. }));
    }

    #[test]
    fn test_http_error_status() {
        let body = r#"{"error":"bad request"}"#;
        let text = ForecastOutcome::from_response(400, body).to_string();
        assert_eq!(text, format!("API 오류 응답 (코드: 400): {}", body));
    }

    #[test]
    fn test_malformed_json() {
        let outcome = ForecastOutcome::from_response(200, "{\"response\": ");
        assert!(matches!(outcome, ForecastOutcome::MalformedJson(_)));
        assert!(outcome.to_string().starts_with("JSON 처리 중 오류가 발생했습니다: "));
    }

    #[test]
    fn test_api_error_result_code() {
        let body = json!({
            "response": {"header": {"resultCode": "30", "resultMsg": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR"}}
        })
        .to_string();
        let outcome = ForecastOutcome::from_response(200, &body);
        assert!(outcome.is_error());
        assert_eq!(outcome.to_string(), "API 오류: SERVICE_KEY_IS_NOT_REGISTERED_ERROR");
    }

    #[test]
    fn test_api_error_null_message() {
        let body = json!({
            "response": {"header": {"resultCode": "99", "resultMsg": null}}
        })
        .to_string();
        let outcome = ForecastOutcome::from_response(200, &body);
        assert!(outcome.is_error());
        assert_eq!(outcome.to_string(), "API 오류: null");
    }

    #[test]
    fn test_api_error_missing_message() {
        let body = json!({"response": {"header": {"resultCode": "99"}}}).to_string();
        let outcome = ForecastOutcome::from_response(200, &body);
        assert_eq!(outcome.to_string(), "API 오류: ");
    }

    #[test]
    fn test_success_by_message() {
        let header = ApiHeader {
            result_code: "99".to_string(),
            result_msg: "정상 처리".to_string(),
        };
        assert!(header.is_success());

        let header = ApiHeader {
            result_code: "03".to_string(),
            result_msg: "NODATA_ERROR".to_string(),
        };
        assert!(!header.is_success());
    }

    #[test]
    fn test_missing_body_and_items() {
        let body = json!({"response": {"header": {"resultCode": "00", "resultMsg": "NORMAL"}}}).to_string();
        assert_eq!(ForecastOutcome::from_response(200, &body), ForecastOutcome::MissingBody);

        let body = envelope(json!({"totalCount": 0}));
        assert_eq!(ForecastOutcome::from_response(200, &body), ForecastOutcome::MissingItems);

        let body = envelope(json!({"items": null}));
        assert_eq!(
            ForecastOutcome::from_response(200, &body).to_string(),
            "API 응답에 items 정보가 없습니다."
        );
    }

    #[test]
    fn test_report_sections_in_order() {
        let body = envelope(json!({"items": [sample_item()], "totalCount": 1}));
        let outcome = ForecastOutcome::from_response(200, &body);
        assert!(!outcome.is_error());

        let text = outcome.to_string();
        let labels = [
            "📅 발표일: 2024-01-01",
            "🔹 예보문: 대기 정체로 농도가 높겠습니다.",
            "[1일 후 예보 - 2024-01-02]",
            "[2일 후 예보 - 2024-01-03]",
            "[3일 후 예보 - 2024-01-04]",
            "[4일 후 예보 - 2024-01-05]",
        ];
        let mut last = 0;
        for label in labels {
            let pos = text[last..]
                .find(label)
                .unwrap_or_else(|| panic!("missing or out of order: {}", label));
            last += pos + label.len();
        }
    }

    #[test]
    fn test_report_exact_layout() {
        let forecast = WeeklyForecast::from_item(&sample_item());
        let expected = "📅 발표일: 2024-01-01\n\
                        \n\
                        🔹 예보문: 대기 정체로 농도가 높겠습니다.\n\
                        \n\
                        [1일 후 예보 - 2024-01-02]\n\
                        서울 : 높음, 부산 : 낮음\n\
                        \n\
                        [2일 후 예보 - 2024-01-03]\n\
                        서울 : 낮음\n\
                        \n\
                        [3일 후 예보 - 2024-01-04]\n\
                        서울 : 높음\n\
                        \n\
                        [4일 후 예보 - 2024-01-05]\n\
                        서울 : 낮음\n";
        assert_eq!(forecast.to_string(), expected);
    }

    #[test]
    fn test_report_missing_fields_use_placeholder() {
        let item = json!({"frcstOneCn": "서울 : 보통", "frcstTwoDt": null});
        let forecast = WeeklyForecast::from_item(&item);
        assert_eq!(forecast.announced_at, "정보 없음");
        assert_eq!(forecast.outlook, "정보 없음");
        assert_eq!(forecast.days[0].content, "서울 : 보통");
        assert_eq!(forecast.days[1].date, "정보 없음");
    }

    #[test]
    fn test_empty_items() {
        let body = envelope(json!({"items": [], "totalCount": 0}));
        let outcome = ForecastOutcome::from_response(200, &body);
        assert_eq!(outcome, ForecastOutcome::NoData);
        assert!(!outcome.is_error());
        assert!(outcome.to_string().contains("데이터가 없습니다"));
    }

    #[test]
    fn test_items_without_forecast_list_dates() {
        let body = envelope(json!({
            "items": [{"presnatnDt": "2024-01-01"}, {"presnatnDt": "2024-01-08"}, {}],
            "totalCount": "3"
        }));
        let outcome = ForecastOutcome::from_response(200, &body);
        assert_eq!(
            outcome.to_string(),
            "해당 날짜에 대한 미세먼지 주간예보 데이터가 없습니다.\n\
             [조회 가능 날짜 목록]\n\
             - 2024-01-01\n\
             - 2024-01-08\n\
             - 날짜 정보 없음\n"
        );
        assert!(!outcome.to_string().contains("예보문"));
    }

    #[test]
    fn test_items_without_forecast_zero_total() {
        let body = envelope(json!({"items": [{"presnatnDt": "2024-01-01"}], "totalCount": 0}));
        assert_eq!(ForecastOutcome::from_response(200, &body), ForecastOutcome::NoData);
    }

    #[test]
    fn test_node_text_scalars() {
        assert_eq!(node_text(Some(&json!(3)), "x"), "3");
        assert_eq!(node_text(Some(&json!(true)), "x"), "true");
        assert_eq!(node_text(Some(&Value::Null), "x"), "x");
        assert_eq!(node_text(Some(&json!([1])), "x"), "");
        assert_eq!(node_text(None, "x"), "x");
    }

    #[test]
    fn test_node_int_lenient() {
        assert_eq!(node_int(Some(&json!(5))), 5);
        assert_eq!(node_int(Some(&json!(" 7 "))), 7);
        assert_eq!(node_int(Some(&json!("many"))), 0);
        assert_eq!(node_int(None), 0);
    }
}
