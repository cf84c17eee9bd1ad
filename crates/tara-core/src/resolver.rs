//! Request Resolver: one inbound travel request → ResolvedRequest
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::context::RequestContext;
use crate::data_model::{
    country_code, AdvisoryResult, Citizenship, Profile, ProfileUpdate, ResolvedRequest,
    TravelRequest,
};
use crate::error::TaraError;
use crate::merge::{merge_profile_layers, request_layer};
use crate::ports::{AdvisoryService, ProfileStore, RuleStore};

pub struct RequestResolver {
    rules: Arc<dyn RuleStore>,
    profiles: Arc<dyn ProfileStore>,
    advisory: Arc<dyn AdvisoryService>,
}

impl RequestResolver {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        profiles: Arc<dyn ProfileStore>,
        advisory: Arc<dyn AdvisoryService>,
    ) -> Self {
        Self { rules, profiles, advisory }
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    /// Never fails: faults surface as an `ERROR` status on the result.
    pub async fn resolve(&self, request: TravelRequest) -> ResolvedRequest {
        let ctx = RequestContext::for_profile(&request.profile);
        let span = info_span!("resolve", trace_id = %ctx.trace_id);

        async {
            info!(
                request_type = %request.request_type,
                destination = %request.destination,
                purpose = %request.purpose,
                "received travel request"
            );

            let mut working = ResolvedRequest::begin(&request, &ctx);
            if let Err(err) = self.run(&request, &ctx, &mut working).await {
                error!(error = %err, "resolution failed");
                working.fail(&err);
            }

            self.record_interaction(&working).await;
            info!(status = %working.status, "resolution finished");
            working
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &TravelRequest,
        ctx: &RequestContext,
        working: &mut ResolvedRequest,
    ) -> Result<(), TaraError> {
        let stored = match ctx.identity_key.as_deref() {
            Some(key) => {
                let profile = self.profiles.get(key).await?;
                match &profile {
                    Some(_) => info!(identity = %key, "found existing profile"),
                    None => info!(identity = %key, "new user, profile will be created"),
                }
                profile
            }
            None => {
                debug!("no identity key, resolving statelessly");
                None
            }
        };
        working.user_has_stored_profile = stored.is_some();
        working.citizenship_was_stored =
            stored.as_ref().and_then(Profile::citizenship_code).is_some();

        // Short-circuited interactions record the destination too.
        let destination_code = country_code(&request.destination);
        if !destination_code.is_empty() {
            working.destination_code = Some(destination_code.clone());
        }

        let citizenship = match self.resolve_citizenship(request, ctx, stored.as_ref()).await {
            Some(citizenship) if citizenship.is_known() => citizenship,
            _ => {
                warn!("missing citizenship, requesting it from the user");
                working.await_citizenship();
                return Ok(());
            }
        };
        working.origin_country = Some(citizenship.name.clone());
        working.origin_code = Some(citizenship.code.clone());

        if destination_code.is_empty() {
            return Err(TaraError::InputError(
                "destination country is required".to_string(),
            ));
        }

        let merged = merge_profile_layers(
            request_layer(request, &citizenship),
            stored.as_ref(),
            request.context.as_ref(),
        );
        let anonymized = merged.anonymized();
        working.profile = merged;

        info!(origin = %citizenship.code, destination = %destination_code, "querying rules and advisory");
        let (label, advice) = tokio::join!(
            self.rules.lookup(&citizenship.code, &destination_code),
            self.advisory
                .advise(&citizenship.name, &request.destination, &anonymized),
        );
        info!(visa_requirement = %label, "rule lookup finished");

        let (advisory, fallback_used) = match advice {
            Ok(advisory) => (advisory, false),
            Err(err) => {
                warn!(error = %err, "advisory service unavailable, using offline fallback");
                (AdvisoryResult::unavailable(), true)
            }
        };
        if advisory.needs_more_info() {
            info!(
                fields = ?advisory.outstanding_fields.keys().collect::<Vec<_>>(),
                "advisory requested more information"
            );
        }

        working.conclude(label, advisory, fallback_used);
        Ok(())
    }

    /// Stored > supplied > none. A supplied citizenship is persisted right away
    /// when the request carries an identity key.
    async fn resolve_citizenship(
        &self,
        request: &TravelRequest,
        ctx: &RequestContext,
        stored: Option<&Profile>,
    ) -> Option<Citizenship> {
        if let Some(citizenship) = stored.and_then(Profile::stored_citizenship) {
            info!(code = %citizenship.code, "using stored citizenship");
            return Some(citizenship);
        }

        let citizenship = request.profile.nationalities.first()?.citizenship();
        info!(name = %citizenship.name, code = %citizenship.code, "citizenship supplied in request");

        if let (Some(key), true) = (ctx.identity_key.as_deref(), citizenship.is_known()) {
            let update = match stored {
                Some(_) => ProfileUpdate::citizenship(&citizenship),
                None => ProfileUpdate::citizenship(&citizenship).with_contact(
                    request.profile.email.clone(),
                    request.profile.display_name.clone(),
                ),
            };
            match self.profiles.upsert(key, update).await {
                Ok(()) => info!(identity = %key, "saved citizenship to profile"),
                Err(err) => warn!(identity = %key, error = %err, "failed to save citizenship"),
            }
        }

        Some(citizenship)
    }

    async fn record_interaction(&self, working: &ResolvedRequest) {
        let Some(key) = working.identity_key.as_deref() else {
            return;
        };

        let interaction = match working.to_interaction() {
            Ok(interaction) => interaction,
            Err(err) => {
                warn!(error = %err, "could not serialize interaction");
                return;
            }
        };

        if let Err(err) = self.profiles.append_interaction(key, interaction).await {
            warn!(identity = %key, error = %err, "failed to append interaction");
        }
    }
}
