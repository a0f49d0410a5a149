use anyhow::Result;
use std::{
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::lifecycle::{
    BatchError, BatchPromotionDriver, TransitionAction, TransitionEngine, TransitionError,
    TransitionOutcome,
};
use crate::playlist_store::{
    NewPlaylist, Playlist, PlaylistFilter, SpaceType, StatusFlag, Track,
};
use crate::scoring::{evaluate, Evaluation, Grade, ListeningProfile, ProfileCache};
use tower_http::services::ServeDir;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub playlists: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

fn error_response(status: StatusCode, kind: &'static str, message: String) -> Response {
    (status, Json(ErrorBody { kind, message })).into_response()
}

fn transition_error_response(err: TransitionError) -> Response {
    let message = err.to_string();
    match err {
        TransitionError::InvalidTransition { .. } => {
            error_response(StatusCode::CONFLICT, "invalid_transition", message)
        }
        TransitionError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "not_found", message),
        TransitionError::Conflict(_) => error_response(StatusCode::CONFLICT, "conflict", message),
        TransitionError::Storage(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage", message)
        }
    }
}

fn storage_error_response(err: anyhow::Error) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage", err.to_string())
}

fn transition_outcome_response(outcome: TransitionOutcome) -> Response {
    match outcome {
        TransitionOutcome::Updated(playlist) => Json(playlist).into_response(),
        TransitionOutcome::Deleted => StatusCode::OK.into_response(),
    }
}

async fn home(State(state): State<ServerState>) -> Response {
    let playlists = match state.playlist_store.playlists_count() {
        Ok(count) => count,
        Err(err) => return storage_error_response(err),
    };
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        playlists,
    };
    Json(stats).into_response()
}

#[derive(Serialize)]
struct PlaylistCreatedResponse {
    id: i64,
}

async fn post_playlist(
    State(store): State<GuardedPlaylistStore>,
    Json(body): Json<NewPlaylist>,
) -> Response {
    if body.name.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_argument",
            "Playlist name must not be empty".to_string(),
        );
    }
    match store.create_playlist(&body) {
        Ok(id) => (StatusCode::CREATED, Json(PlaylistCreatedResponse { id })).into_response(),
        Err(err) => storage_error_response(err),
    }
}

#[derive(Deserialize, Debug)]
struct ListPlaylistsQuery {
    space: Option<String>,
    status: Option<String>,
    owner_id: Option<i64>,
}

async fn get_playlists(
    State(store): State<GuardedPlaylistStore>,
    Query(query): Query<ListPlaylistsQuery>,
) -> Response {
    let space = match query.space.as_deref().map(SpaceType::from_str).transpose() {
        Ok(space) => space,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, "invalid_argument", err),
    };
    let status = match query.status.as_deref().map(StatusFlag::from_str).transpose() {
        Ok(status) => status,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, "invalid_argument", err),
    };
    let filter = PlaylistFilter {
        space,
        status,
        owner_id: query.owner_id,
    };
    match store.list_playlists(&filter) {
        Ok(playlists) => Json(playlists).into_response(),
        Err(err) => storage_error_response(err),
    }
}

#[derive(Serialize)]
struct PlaylistWithTracks {
    #[serde(flatten)]
    playlist: Playlist,
    tracks: Vec<Track>,
}

async fn get_playlist(State(store): State<GuardedPlaylistStore>, Path(id): Path<i64>) -> Response {
    let playlist = match store.get_playlist(id) {
        Ok(Some(playlist)) => playlist,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Playlist not found: {}", id),
            )
        }
        Err(err) => return storage_error_response(err),
    };
    match store.get_playlist_tracks(id) {
        Ok(tracks) => Json(PlaylistWithTracks { playlist, tracks }).into_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn delete_playlist(
    State(store): State<GuardedPlaylistStore>,
    Path(id): Path<i64>,
) -> Response {
    match store.delete_playlist(id) {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("Playlist not found: {}", id),
        ),
        Err(err) => storage_error_response(err),
    }
}

#[derive(Deserialize, Debug)]
struct SetStatusBody {
    status: String,
}

async fn patch_playlist_status(
    State(engine): State<GuardedTransitionEngine>,
    Path(id): Path<i64>,
    Json(body): Json<SetStatusBody>,
) -> Response {
    let status = match StatusFlag::from_str(&body.status) {
        Ok(status) => status,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, "invalid_argument", err),
    };
    match engine.transition(id, TransitionAction::SetStatus(status)) {
        Ok(outcome) => transition_outcome_response(outcome),
        Err(err) => transition_error_response(err),
    }
}

#[derive(Deserialize, Debug)]
struct MovePlaylistBody {
    space_type: String,
}

async fn patch_playlist_move(
    State(engine): State<GuardedTransitionEngine>,
    Path(id): Path<i64>,
    Json(body): Json<MovePlaylistBody>,
) -> Response {
    let space = match SpaceType::from_str(&body.space_type) {
        Ok(space) => space,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, "invalid_argument", err),
    };
    match engine.transition(id, TransitionAction::Move(space)) {
        Ok(outcome) => transition_outcome_response(outcome),
        Err(err) => transition_error_response(err),
    }
}

async fn approve_playlist(
    State(engine): State<GuardedTransitionEngine>,
    Path(id): Path<i64>,
) -> Response {
    match engine.transition(id, TransitionAction::Approve) {
        Ok(outcome) => transition_outcome_response(outcome),
        Err(err) => transition_error_response(err),
    }
}

async fn reject_playlist(
    State(engine): State<GuardedTransitionEngine>,
    Path(id): Path<i64>,
) -> Response {
    match engine.transition(id, TransitionAction::Reject) {
        Ok(outcome) => transition_outcome_response(outcome),
        Err(err) => transition_error_response(err),
    }
}

#[derive(Deserialize, Debug)]
struct TrainBody {
    user_id: i64,
}

async fn train_profile(State(state): State<ServerState>, Json(body): Json<TrainBody>) -> Response {
    let profile = match ListeningProfile::derive(
        state.playlist_store.as_ref(),
        body.user_id,
        state.config.profile_top_n,
    ) {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("No Platform-sourced tracks for user {}", body.user_id),
            )
        }
        Err(err) => return storage_error_response(err),
    };
    debug!(
        "Trained profile for user {}: {} artists, {} genres",
        body.user_id,
        profile.top_artists.len(),
        profile.top_genres.len()
    );
    let response = Json(&profile).into_response();
    state.profile_cache.put(profile);
    response
}

#[derive(Deserialize, Debug)]
struct EvaluateBody {
    user_id: i64,
}

#[derive(Serialize)]
struct EvaluationResponse {
    playlist_id: i64,
    score: f64,
    grade: Grade,
    reason: String,
    /// True when the evaluation flipped a (PMS, PRP) playlist to PFP.
    verified: bool,
}

async fn evaluate_playlist(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<EvaluateBody>,
) -> Response {
    let playlist = match state.playlist_store.get_playlist(id) {
        Ok(Some(playlist)) => playlist,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Playlist not found: {}", id),
            )
        }
        Err(err) => return storage_error_response(err),
    };
    let tracks = match state.playlist_store.get_playlist_tracks(id) {
        Ok(tracks) => tracks,
        Err(err) => return storage_error_response(err),
    };

    let profile = state.profile_cache.get(body.user_id);
    let Evaluation {
        score,
        grade,
        reason,
    } = evaluate(profile.as_deref(), &tracks, &state.config.scoring_policy);

    if let Err(err) = state
        .playlist_store
        .upsert_score(id, body.user_id, score, &reason)
    {
        return storage_error_response(err);
    }

    // A reviewed PMS playlist that clears the verification threshold is
    // marked fully processed.
    let mut verified = false;
    if (playlist.space, playlist.status) == (SpaceType::Pms, StatusFlag::Prp)
        && score >= state.config.verification_threshold
    {
        match state
            .engine
            .transition(id, TransitionAction::SetStatus(StatusFlag::Pfp))
        {
            Ok(_) => verified = true,
            Err(err) => return transition_error_response(err),
        }
    }

    Json(EvaluationResponse {
        playlist_id: id,
        score,
        grade,
        reason,
        verified,
    })
    .into_response()
}

#[derive(Deserialize, Debug)]
struct PromoteBody {
    user_id: i64,
    threshold: Option<f64>,
}

async fn promote_playlists(
    State(state): State<ServerState>,
    Json(body): Json<PromoteBody>,
) -> Response {
    let threshold = body.threshold.unwrap_or(state.config.promotion_threshold);
    if !(0.0..=100.0).contains(&threshold) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_argument",
            format!("Threshold must be within 0..=100, got {}", threshold),
        );
    }

    let driver = BatchPromotionDriver::new(
        state.playlist_store.clone(),
        state.engine.clone(),
        state.profile_cache.clone(),
        state.config.scoring_policy,
    );
    match driver.promote_all(body.user_id, threshold) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err @ BatchError::ProfileNotTrained(_)) => {
            error_response(StatusCode::CONFLICT, "profile_not_trained", err.to_string())
        }
        Err(BatchError::Storage(err)) => storage_error_response(err),
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        playlist_store: GuardedPlaylistStore,
        profile_cache: GuardedProfileCache,
    ) -> ServerState {
        let engine = Arc::new(TransitionEngine::new(playlist_store.clone()));
        ServerState {
            config,
            start_time: Instant::now(),
            playlist_store,
            engine,
            profile_cache,
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    playlist_store: GuardedPlaylistStore,
    profile_cache: GuardedProfileCache,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), playlist_store, profile_cache);

    let playlist_routes: Router = Router::new()
        .route("/", post(post_playlist))
        .route("/", get(get_playlists))
        .route("/{id}", get(get_playlist))
        .route("/{id}", delete(delete_playlist))
        .route("/{id}/status", patch(patch_playlist_status))
        .route("/{id}/move", patch(patch_playlist_move))
        .route("/{id}/approve", post(approve_playlist))
        .route("/{id}/reject", post(reject_playlist))
        .with_state(state.clone());

    let analysis_routes: Router = Router::new()
        .route("/train", post(train_profile))
        .route("/evaluate/{id}", post(evaluate_playlist))
        .route("/promote", post(promote_playlists))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/v1/playlists", playlist_routes)
        .nest("/v1/analysis", analysis_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    playlist_store: GuardedPlaylistStore,
    profile_cache: GuardedProfileCache,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, playlist_store, profile_cache)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
