use serde::{Deserialize, Serialize, Serializer, ser};

/// Optional tunables for one chat-completion call
///
/// Every field is independently optional. An absent field is left out of the
/// serialized body entirely so the service applies its own default. Values
/// are not range-checked here; see [`crate::validation`] for the opt-in
/// checks a caller may run before sending.
///
/// Field names match the JSON keys of the request body
/// (<https://docs.mistral.ai/api/#tag/chat/operation/chat_completion_v1_chat_completions_post>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestParameters {
    /// Identifier of the target model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Upper bound on generated tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "finite")]
    pub temperature: Option<f64>,
    /// Nucleus sampling probability mass
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "finite")]
    pub top_p: Option<f64>,
    /// Seed for reproducible sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,
    /// Number of completions to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<i64>,
    /// Enable content-safety filtering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_mode: Option<bool>,
    /// Reasoning behavior mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_mode: Option<String>,
    /// Penalty on tokens already present in the text
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "finite")]
    pub presence_penalty: Option<f64>,
    /// Penalty proportional to token frequency
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "finite")]
    pub frequency_penalty: Option<f64>,
}

impl RequestParameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the maximum number of generated tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the nucleus sampling threshold
    #[must_use]
    pub const fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the sampling seed
    #[must_use]
    pub const fn with_random_seed(mut self, seed: i64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the number of completions
    #[must_use]
    pub const fn with_n(mut self, n: i64) -> Self {
        self.n = Some(n);
        self
    }

    /// Enable or disable safety filtering
    #[must_use]
    pub const fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = Some(safe_mode);
        self
    }

    /// Set the reasoning mode
    #[must_use]
    pub fn with_reasoning_mode(mut self, mode: impl Into<String>) -> Self {
        self.reasoning_mode = Some(mode.into());
        self
    }

    /// Set the presence penalty
    #[must_use]
    pub const fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Set the frequency penalty
    #[must_use]
    pub const fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.present_keys().is_empty()
    }

    /// Fill every absent field from `fallback`
    ///
    /// Fields already set on `self` always win, so per-call overrides can be
    /// layered over configured defaults with `overrides.merge(defaults)`.
    #[must_use]
    pub fn merge(self, fallback: Self) -> Self {
        Self {
            model: self.model.or(fallback.model),
            max_tokens: self.max_tokens.or(fallback.max_tokens),
            temperature: self.temperature.or(fallback.temperature),
            top_p: self.top_p.or(fallback.top_p),
            random_seed: self.random_seed.or(fallback.random_seed),
            n: self.n.or(fallback.n),
            safe_mode: self.safe_mode.or(fallback.safe_mode),
            reasoning_mode: self.reasoning_mode.or(fallback.reasoning_mode),
            presence_penalty: self.presence_penalty.or(fallback.presence_penalty),
            frequency_penalty: self.frequency_penalty.or(fallback.frequency_penalty),
        }
    }

    /// Wire names of the fields that are set, in body order
    pub fn present_keys(&self) -> Vec<&'static str> {
        let flags = [
            ("model", self.model.is_some()),
            ("max_tokens", self.max_tokens.is_some()),
            ("temperature", self.temperature.is_some()),
            ("top_p", self.top_p.is_some()),
            ("random_seed", self.random_seed.is_some()),
            ("n", self.n.is_some()),
            ("safe_mode", self.safe_mode.is_some()),
            ("reasoning_mode", self.reasoning_mode.is_some()),
            ("presence_penalty", self.presence_penalty.is_some()),
            ("frequency_penalty", self.frequency_penalty.is_some()),
        ];

        flags
            .into_iter()
            .filter_map(|(key, present)| present.then_some(key))
            .collect()
    }
}

/// Write a float as a JSON number, refusing NaN and infinities
///
/// `serde_json` would otherwise emit those as `null`, which reads back as an
/// absent field.
#[allow(clippy::ref_option)]
fn finite<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match *value {
        Some(v) if !v.is_finite() => Err(<S::Error as ser::Error>::custom(format_args!(
            "parameter value {v} is not a finite number"
        ))),
        Some(v) => serializer.serialize_some(&v),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn full() -> RequestParameters {
        RequestParameters::new()
            .with_model("mistral-large-latest")
            .with_max_tokens(256)
            .with_temperature(0.3)
            .with_top_p(0.9)
            .with_random_seed(42)
            .with_n(2)
            .with_safe_mode(true)
            .with_reasoning_mode("reasoning")
            .with_presence_penalty(0.5)
            .with_frequency_penalty(-0.25)
    }

    #[test]
    fn empty_serializes_to_empty_object() {
        let body = serde_json::to_string(&RequestParameters::default()).unwrap();
        assert_eq!(body, "{}");
    }

    #[test]
    fn only_present_fields_are_serialized() {
        let params = RequestParameters {
            model: Some("mistral-large".to_owned()),
            temperature: Some(0.7),
            ..Default::default()
        };

        let body = serde_json::to_string(&params).unwrap();
        assert_eq!(body, r#"{"model":"mistral-large","temperature":0.7}"#);
    }

    #[test]
    fn all_fields_use_their_wire_names_and_kinds() {
        let body = serde_json::to_string_pretty(&full()).unwrap();

        insta::assert_snapshot!(body, @r#"
        {
          "model": "mistral-large-latest",
          "max_tokens": 256,
          "temperature": 0.3,
          "top_p": 0.9,
          "random_seed": 42,
          "n": 2,
          "safe_mode": true,
          "reasoning_mode": "reasoning",
          "presence_penalty": 0.5,
          "frequency_penalty": -0.25
        }
        "#);
    }

    #[test]
    fn value_kinds_match_declared_types() {
        let value = serde_json::to_value(full()).unwrap();
        let object = value.as_object().unwrap();

        assert!(object["model"].is_string());
        assert!(object["reasoning_mode"].is_string());
        assert!(object["max_tokens"].is_i64());
        assert!(object["random_seed"].is_i64());
        assert!(object["n"].is_i64());
        assert!(object["temperature"].is_f64());
        assert!(object["top_p"].is_f64());
        assert!(object["presence_penalty"].is_f64());
        assert!(object["frequency_penalty"].is_f64());
        assert!(object["safe_mode"].is_boolean());
        assert!(object.values().all(|v| !v.is_null()));
    }

    #[test]
    fn non_finite_floats_fail_to_serialize() {
        let err = serde_json::to_string(&RequestParameters::new().with_temperature(f64::NAN)).unwrap_err();
        assert!(err.to_string().contains("NaN is not a finite number"));

        let err = serde_json::to_string(&RequestParameters::new().with_top_p(f64::INFINITY)).unwrap_err();
        assert!(err.to_string().contains("inf is not a finite number"));

        assert!(serde_json::to_value(RequestParameters::new().with_presence_penalty(f64::NEG_INFINITY)).is_err());
        assert!(serde_json::to_value(RequestParameters::new().with_frequency_penalty(f64::NAN)).is_err());
    }

    #[test]
    fn negative_n_is_accepted() {
        let params = RequestParameters::new().with_n(-3);
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({ "n": -3 }));
    }

    #[test]
    fn deserialize_reproduces_present_fields() {
        let params = full();
        let body = serde_json::to_string(&params).unwrap();
        let parsed: RequestParameters = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, params);

        let sparse = RequestParameters::new().with_safe_mode(false).with_top_p(1.0);
        let parsed: RequestParameters = serde_json::from_value(serde_json::to_value(&sparse).unwrap()).unwrap();
        assert_eq!(parsed, sparse);
        assert_eq!(parsed.present_keys(), ["top_p", "safe_mode"]);
    }

    #[test]
    fn explicit_null_reads_as_absent() {
        let parsed: RequestParameters = serde_json::from_value(json!({ "model": null, "n": 1 })).unwrap();
        assert_eq!(parsed, RequestParameters::new().with_n(1));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_json::from_value::<RequestParameters>(json!({ "temprature": 0.1 })).unwrap_err();
        assert!(err.to_string().contains("temprature"));
    }

    #[test]
    fn merge_prefers_own_fields() {
        let defaults = RequestParameters::new()
            .with_model("mistral-small-latest")
            .with_temperature(0.7)
            .with_max_tokens(512);
        let overrides = RequestParameters::new().with_temperature(0.1).with_n(3);

        let merged = overrides.merge(defaults);

        assert_eq!(merged.model.as_deref(), Some("mistral-small-latest"));
        assert_eq!(merged.temperature, Some(0.1));
        assert_eq!(merged.max_tokens, Some(512));
        assert_eq!(merged.n, Some(3));
        assert_eq!(merged.top_p, None);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        assert_eq!(full().merge(RequestParameters::default()), full());
        assert_eq!(RequestParameters::default().merge(full()), full());
    }

    #[test]
    fn is_empty_tracks_any_field() {
        assert!(RequestParameters::new().is_empty());
        assert!(!RequestParameters::new().with_safe_mode(false).is_empty());
        assert_eq!(full().present_keys().len(), 10);
    }

    #[test]
    fn present_keys_match_serialized_keys() {
        let params = RequestParameters::new().with_model("m").with_frequency_penalty(1.0);
        let Value::Object(object) = serde_json::to_value(&params).unwrap() else {
            panic!("expected object");
        };
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        let mut present = params.present_keys();
        keys.sort_unstable();
        present.sort_unstable();
        assert_eq!(present, keys);
    }
}
