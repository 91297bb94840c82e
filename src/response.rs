use axum::Json;
use serde_json::{json, Value};

/// `{"status":"success","data":…}`
pub fn success(data: Value) -> Json<Value> {
    Json(json!({ "status": "success", "data": data }))
}

/// `{"status":"success","message":…,"data":…}`
pub fn success_with_message(message: &str, data: Value) -> Json<Value> {
    Json(json!({ "status": "success", "message": message, "data": data }))
}

/// `{"status":"success","message":…}`
pub fn success_message(message: &str) -> Json<Value> {
    Json(json!({ "status": "success", "message": message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_carry_the_status_discriminant() {
        let Json(body) = success(json!({"k": 1}));
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["k"], 1);

        let Json(body) = success_with_message("done", json!([1, 2]));
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "done");
        assert_eq!(body["data"][1], 2);

        let Json(body) = success_message("done");
        assert_eq!(body["status"], "success");
        assert!(body.get("data").is_none());
    }
}
