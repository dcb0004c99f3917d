use std::{fmt, sync::Arc};

use aic_core::{AmInstance, AmRealm, DebugLog, LibraryConfig};
use reqwest::header::HeaderMap;
use tracing::{debug, info_span, Instrument};

use crate::{
    actions::run_action,
    email::{ImapInbox, Inbox},
    error::JourneyError,
    journey::CookieParam,
    step::{JourneyStep, StepOperations, StepSource},
    Journey,
};

/// Where in a step a set of operations runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStage {
    /// Before the turn is submitted.
    PreStep,
    /// After the turn's outcome is known.
    PostStep,
}

impl StepStage {
    #[allow(missing_docs)]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreStep => "preStep",
            Self::PostStep => "postStep",
        }
    }
}

impl fmt::Display for StepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to run one journey from start to end.
///
/// `am_url` and `realm_name` fall back to `BASE_URL` and `REALM` of the configuration.
#[derive(Debug)]
pub struct RunJourney {
    #[allow(missing_docs)]
    pub am_url: Option<String>,
    #[allow(missing_docs)]
    pub realm_name: Option<String>,
    #[allow(missing_docs)]
    pub journey_name: String,
    #[allow(missing_docs)]
    pub headers: HeaderMap,
    #[allow(missing_docs)]
    pub query_params: Vec<(String, String)>,
    #[allow(missing_docs)]
    pub cookie: Option<CookieParam>,
    #[allow(missing_docs)]
    pub steps: Vec<StepSource>,
}

impl RunJourney {
    #[allow(missing_docs)]
    pub fn new(journey_name: impl Into<String>) -> Self {
        Self {
            am_url: None,
            realm_name: None,
            journey_name: journey_name.into(),
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            cookie: None,
            steps: Vec::new(),
        }
    }

    #[allow(missing_docs)]
    pub fn am_url(mut self, am_url: impl Into<String>) -> Self {
        self.am_url = Some(am_url.into());
        self
    }

    #[allow(missing_docs)]
    pub fn realm_name(mut self, realm_name: impl Into<String>) -> Self {
        self.realm_name = Some(realm_name.into());
        self
    }

    #[allow(missing_docs)]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[allow(missing_docs)]
    pub fn query_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    #[allow(missing_docs)]
    pub fn cookie(mut self, cookie: CookieParam) -> Self {
        self.cookie = Some(cookie);
        self
    }

    #[allow(missing_docs)]
    pub fn steps(mut self, steps: Vec<StepSource>) -> Self {
        self.steps = steps;
        self
    }
}

/// Run a whole journey and return its final state.
///
/// The inbox used by `checkEmail` actions is taken from the mail settings of `config` when
/// they are present.
pub async fn run_journey(
    params: RunJourney,
    config: &LibraryConfig,
) -> Result<Journey, JourneyError> {
    let am_url = params
        .am_url
        .or_else(|| config.base_url.clone())
        .ok_or(JourneyError::NoAmUrl)?;
    let realm_name = params
        .realm_name
        .or_else(|| config.realm.clone())
        .ok_or(JourneyError::NoRealm)?;

    let realm = AmRealm::new(realm_name, AmInstance::new(&am_url)?);
    let mut journey = Journey::new(params.journey_name, realm)
        .with_headers(params.headers)
        .with_query_params(params.query_params)
        .with_debug_log(DebugLog::from_config(config));
    if let Some(cookie) = params.cookie {
        journey = journey.with_cookie(cookie);
    }
    if let Some(inbox) = configured_inbox(config) {
        journey = journey.with_inbox(inbox);
    }

    let steps = pre_process_journey_steps(params.steps);
    let span = info_span!("journey", name = journey.name());
    process_journey_steps(&mut journey, &steps)
        .instrument(span)
        .await?;

    Ok(journey)
}

/// The IMAP inbox of `config`, or `None` when its mail settings are incomplete.
fn configured_inbox(config: &LibraryConfig) -> Option<Arc<dyn Inbox>> {
    match ImapInbox::from_config(config) {
        Ok(inbox) => Some(Arc::new(inbox)),
        Err(error) => {
            debug!(%error, "no inbox configured, checkEmail actions will fail");
            None
        }
    }
}

/// Resolve deferred steps, keeping their order.
pub fn pre_process_journey_steps(steps: Vec<StepSource>) -> Vec<JourneyStep> {
    steps.into_iter().map(StepSource::resolve).collect()
}

/// Run every step in order: pre-step operations, one turn, post-step operations.
///
/// The first failing validation or action aborts the run.
pub async fn process_journey_steps(
    journey: &mut Journey,
    steps: &[JourneyStep],
) -> Result<(), JourneyError> {
    for step in steps {
        debug!(step = %step.name, "processing step");

        if let Some(operations) = &step.pre_step {
            process_step_operations(journey, operations, &step.name, StepStage::PreStep).await?;
        }

        journey.next_step().await;

        if let Some(operations) = &step.post_step {
            process_step_operations(journey, operations, &step.name, StepStage::PostStep).await?;
        }
    }
    Ok(())
}

/// Validations first (error, response, callbacks), then actions in declared order.
pub async fn process_step_operations(
    journey: &mut Journey,
    operations: &StepOperations,
    step_name: &str,
    stage: StepStage,
) -> Result<(), JourneyError> {
    if let Some(validation) = &operations.validation {
        if let Some(matchers) = &validation.error {
            journey.validate_error(matchers, step_name, Some(stage.as_str()))?;
        }
        if let Some(matchers) = &validation.response {
            let label = format!("{stage} validation response");
            journey.validate_response(matchers, step_name, Some(&label))?;
        }
        if let Some(matchers) = &validation.callbacks {
            let label = format!("{stage} validation callbacks");
            journey.validate_callbacks(matchers, step_name, Some(&label))?;
        }
    }

    if let Some(actions) = &operations.actions {
        let label = format!("{stage} actions");
        for action in actions {
            run_action(journey, action, step_name, &label).await?;
        }
    }
    Ok(())
}
