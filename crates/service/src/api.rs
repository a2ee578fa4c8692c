use crate::metrics::{
    inc_credential_awarded, inc_credential_revoked, metrics_middleware, render_metrics,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use credentials_common::entities::{
    certificate_template_assets, certificate_templates, course_certificates,
    program_certificates, signatories, site_configurations, sites, user_credential_attributes,
    user_credentials,
};
use credentials_common::models::*;
use credentials_common::validation::{MAX_IMAGE_BYTES, ValidationError};
use credentials_common::{
    CredentialRef, CredentialsError, UsageKey, Upload, assets, certificates, credentials, grades,
    sites as site_ops,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

type ApiResult<T> = std::result::Result<T, CredentialsError>;

type SiteModel = sites::Model;
type SiteConfigurationModel = site_configurations::Model;
type TemplateModel = certificate_templates::Model;
type CourseCertificateModel = course_certificates::Model;
type ProgramCertificateModel = program_certificates::Model;
type UserCredentialModel = user_credentials::Model;
type AttributeModel = user_credential_attributes::Model;

/// 上传路由的请求体上限，其余路由沿用 axum 默认的 2MB
const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn router(state: AppState) -> axum::Router {
    let media_path = state.media_url.trim_end_matches('/').to_string();
    let media_files = ServeDir::new(&state.media_root);

    axum::Router::new()
        .route("/api/v1/sites", post(create_site).get(list_sites))
        .route(
            "/api/v1/sites/{id}",
            get(get_site).patch(update_site).delete(delete_site),
        )
        .route(
            "/api/v1/sites/{id}/configuration",
            post(create_site_configuration)
                .get(get_site_configuration)
                .patch(update_site_configuration),
        )
        .route(
            "/api/v1/signatories",
            post(create_signatory)
                .get(list_signatories)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/signatories/{id}",
            get(get_signatory)
                .patch(update_signatory)
                .delete(delete_signatory)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/templates", post(create_template).get(list_templates))
        .route(
            "/api/v1/templates/{id}",
            get(get_template).patch(update_template).delete(delete_template),
        )
        .route(
            "/api/v1/template-assets",
            post(create_template_asset)
                .get(list_template_assets)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/template-assets/{id}",
            get(get_template_asset)
                .patch(rename_template_asset)
                .delete(delete_template_asset),
        )
        .route(
            "/api/v1/course-certificates",
            post(create_course_certificate).get(list_course_certificates),
        )
        .route(
            "/api/v1/course-certificates/{id}",
            get(get_course_certificate)
                .patch(update_course_certificate)
                .delete(delete_course_certificate),
        )
        .route(
            "/api/v1/course-certificates/{id}/signatories",
            get(course_certificate_signatories),
        )
        .route(
            "/api/v1/program-certificates",
            post(create_program_certificate).get(list_program_certificates),
        )
        .route(
            "/api/v1/program-certificates/{id}",
            get(get_program_certificate)
                .patch(update_program_certificate)
                .delete(delete_program_certificate),
        )
        .route(
            "/api/v1/program-certificates/{id}/signatories",
            get(program_certificate_signatories),
        )
        .route("/api/v1/credentials", post(award_credential).get(list_credentials))
        .route("/api/v1/credentials/{id}", get(get_credential))
        .route("/api/v1/credentials/{id}/revoke", post(revoke_credential))
        .route(
            "/api/v1/credentials/{id}/attributes",
            get(list_attributes).put(set_attribute),
        )
        .route("/api/v1/grades/histogram", get(grade_histogram))
        .route("/api/v1/metrics", get(metrics))
        .merge(crate::notes::router())
        .route_layer(axum::middleware::from_fn(metrics_middleware))
        .nest_service(&media_path, media_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ 站点 ============

async fn create_site(
    State(state): State<AppState>,
    Json(payload): Json<CreateSite>,
) -> ApiResult<(StatusCode, Json<SiteModel>)> {
    let site = site_ops::create_site(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(site)))
}

async fn list_sites(State(state): State<AppState>) -> ApiResult<Json<Vec<SiteModel>>> {
    Ok(Json(site_ops::list_sites(&state.db).await?))
}

async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SiteModel>> {
    Ok(Json(site_ops::get_site(&state.db, id).await?))
}

async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSite>,
) -> ApiResult<Json<SiteModel>> {
    Ok(Json(site_ops::update_site(&state.db, id, payload).await?))
}

async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    site_ops::delete_site(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SiteConfigurationBody {
    lms_url_root: String,
    theme_scss_path: String,
}

async fn create_site_configuration(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<SiteConfigurationBody>,
) -> ApiResult<(StatusCode, Json<SiteConfigurationModel>)> {
    let req = CreateSiteConfiguration {
        site_id,
        lms_url_root: payload.lms_url_root,
        theme_scss_path: payload.theme_scss_path,
    };
    let configuration = site_ops::create_site_configuration(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(configuration)))
}

async fn get_site_configuration(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> ApiResult<Json<SiteConfigurationModel>> {
    Ok(Json(site_ops::get_site_configuration(&state.db, site_id).await?))
}

async fn update_site_configuration(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<UpdateSiteConfiguration>,
) -> ApiResult<Json<SiteConfigurationModel>> {
    Ok(Json(
        site_ops::update_site_configuration(&state.db, site_id, payload).await?,
    ))
}

// ============ 上传表单 ============

/// Text fields plus at most one file part of a multipart body.
#[derive(Debug, Default)]
struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<Upload>,
}

impl UploadForm {
    /// `max_file_bytes` 限制文件部分的大小，超出时立即停止读取。
    async fn read(
        mut multipart: Multipart,
        file_field: &str,
        max_file_bytes: Option<usize>,
    ) -> ApiResult<Self> {
        let mut form = UploadForm::default();
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| CredentialsError::bad_request(format!("invalid multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == file_field {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mut data = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| {
                    CredentialsError::bad_request(format!("failed to read {}: {}", name, e))
                })? {
                    data.extend_from_slice(&chunk);
                    if max_file_bytes.is_some_and(|max| data.len() > max) {
                        return Err(ValidationError::ImageTooLarge { size: data.len() }.into());
                    }
                }
                form.file = Some(Upload::new(filename, data));
            } else {
                let value = field.text().await.map_err(|e| {
                    CredentialsError::bad_request(format!("failed to read {}: {}", name, e))
                })?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    fn require(&mut self, name: &str) -> ApiResult<String> {
        self.take(name)
            .ok_or_else(|| CredentialsError::bad_request(format!("{} is required", name)))
    }
}

// ============ 签名人 ============

#[derive(Debug, Serialize)]
struct SignatoryView {
    #[serde(flatten)]
    signatory: signatories::Model,
    image_url: String,
}

impl SignatoryView {
    fn new(state: &AppState, signatory: signatories::Model) -> Self {
        let image_url = state.files.url(&signatory.image);
        Self {
            signatory,
            image_url,
        }
    }
}

async fn create_signatory(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SignatoryView>)> {
    let mut form = UploadForm::read(multipart, "image", Some(MAX_IMAGE_BYTES)).await?;
    let name = form.require("name")?;
    let title = form.require("title")?;
    let image = form
        .file
        .take()
        .ok_or_else(|| CredentialsError::bad_request("image is required"))?;

    let signatory =
        assets::create_signatory(&state.db, state.files.as_ref(), name, title, image).await?;
    Ok((StatusCode::CREATED, Json(SignatoryView::new(&state, signatory))))
}

async fn list_signatories(State(state): State<AppState>) -> ApiResult<Json<Vec<SignatoryView>>> {
    let list = assets::list_signatories(&state.db).await?;
    Ok(Json(
        list.into_iter()
            .map(|signatory| SignatoryView::new(&state, signatory))
            .collect(),
    ))
}

async fn get_signatory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SignatoryView>> {
    let signatory = assets::get_signatory(&state.db, id).await?;
    Ok(Json(SignatoryView::new(&state, signatory)))
}

async fn update_signatory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<SignatoryView>> {
    let mut form = UploadForm::read(multipart, "image", Some(MAX_IMAGE_BYTES)).await?;
    let fields = assets::SignatoryFields {
        name: form.take("name"),
        title: form.take("title"),
    };
    let signatory = assets::update_signatory(
        &state.db,
        state.files.as_ref(),
        id,
        fields,
        form.file.take(),
    )
    .await?;
    Ok(Json(SignatoryView::new(&state, signatory)))
}

async fn delete_signatory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    assets::delete_signatory(&state.db, state.files.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ 模板 ============

async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<CreateCertificateTemplate>,
) -> ApiResult<(StatusCode, Json<TemplateModel>)> {
    let template = certificates::create_template(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn list_templates(State(state): State<AppState>) -> ApiResult<Json<Vec<TemplateModel>>> {
    Ok(Json(certificates::list_templates(&state.db).await?))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TemplateModel>> {
    Ok(Json(certificates::get_template(&state.db, id).await?))
}

async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCertificateTemplate>,
) -> ApiResult<Json<TemplateModel>> {
    Ok(Json(certificates::update_template(&state.db, id, payload).await?))
}

async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    certificates::delete_template(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct TemplateAssetView {
    #[serde(flatten)]
    asset: certificate_template_assets::Model,
    asset_url: String,
}

impl TemplateAssetView {
    fn new(state: &AppState, asset: certificate_template_assets::Model) -> Self {
        let asset_url = state.files.url(&asset.asset_file);
        Self { asset, asset_url }
    }
}

async fn create_template_asset(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<TemplateAssetView>)> {
    let mut form = UploadForm::read(multipart, "asset_file", None).await?;
    let name = form.require("name")?;
    let file = form
        .file
        .take()
        .ok_or_else(|| CredentialsError::bad_request("asset_file is required"))?;

    let asset = assets::create_template_asset(&state.db, state.files.as_ref(), name, file).await?;
    Ok((StatusCode::CREATED, Json(TemplateAssetView::new(&state, asset))))
}

async fn list_template_assets(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TemplateAssetView>>> {
    let list = assets::list_template_assets(&state.db).await?;
    Ok(Json(
        list.into_iter()
            .map(|asset| TemplateAssetView::new(&state, asset))
            .collect(),
    ))
}

async fn get_template_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TemplateAssetView>> {
    let asset = assets::get_template_asset(&state.db, id).await?;
    Ok(Json(TemplateAssetView::new(&state, asset)))
}

#[derive(Debug, Deserialize)]
struct RenameTemplateAsset {
    name: String,
}

async fn rename_template_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameTemplateAsset>,
) -> ApiResult<Json<TemplateAssetView>> {
    let asset = assets::rename_template_asset(&state.db, id, payload.name).await?;
    Ok(Json(TemplateAssetView::new(&state, asset)))
}

async fn delete_template_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    assets::delete_template_asset(&state.db, state.files.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ 证书配置 ============

#[derive(Debug, Default, Deserialize)]
struct CertificateListQuery {
    site_id: Option<Uuid>,
}

async fn create_course_certificate(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseCertificate>,
) -> ApiResult<(StatusCode, Json<CourseCertificateModel>)> {
    let certificate = certificates::create_course_certificate(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

async fn list_course_certificates(
    State(state): State<AppState>,
    Query(query): Query<CertificateListQuery>,
) -> ApiResult<Json<Vec<CourseCertificateModel>>> {
    Ok(Json(
        certificates::list_course_certificates(&state.db, query.site_id).await?,
    ))
}

async fn get_course_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CourseCertificateModel>> {
    Ok(Json(certificates::get_course_certificate(&state.db, id).await?))
}

async fn update_course_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCertificate>,
) -> ApiResult<Json<CourseCertificateModel>> {
    Ok(Json(
        certificates::update_course_certificate(&state.db, id, payload).await?,
    ))
}

async fn delete_course_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    certificates::delete_course_certificate(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn course_certificate_signatories(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<SignatoryView>>> {
    linked_signatories(&state, CredentialRef::CourseCertificate(id)).await
}

async fn create_program_certificate(
    State(state): State<AppState>,
    Json(payload): Json<CreateProgramCertificate>,
) -> ApiResult<(StatusCode, Json<ProgramCertificateModel>)> {
    let certificate = certificates::create_program_certificate(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

async fn list_program_certificates(
    State(state): State<AppState>,
    Query(query): Query<CertificateListQuery>,
) -> ApiResult<Json<Vec<ProgramCertificateModel>>> {
    Ok(Json(
        certificates::list_program_certificates(&state.db, query.site_id).await?,
    ))
}

async fn get_program_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProgramCertificateModel>> {
    Ok(Json(certificates::get_program_certificate(&state.db, id).await?))
}

async fn update_program_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCertificate>,
) -> ApiResult<Json<ProgramCertificateModel>> {
    Ok(Json(
        certificates::update_program_certificate(&state.db, id, payload).await?,
    ))
}

async fn delete_program_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    certificates::delete_program_certificate(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn program_certificate_signatories(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<SignatoryView>>> {
    linked_signatories(&state, CredentialRef::ProgramCertificate(id)).await
}

async fn linked_signatories(
    state: &AppState,
    reference: CredentialRef,
) -> ApiResult<Json<Vec<SignatoryView>>> {
    let list = certificates::certificate_signatories(&state.db, reference).await?;
    Ok(Json(
        list.into_iter()
            .map(|signatory| SignatoryView::new(state, signatory))
            .collect(),
    ))
}

// ============ 用户证书 ============

async fn award_credential(
    State(state): State<AppState>,
    Json(payload): Json<AwardCredentialRequest>,
) -> ApiResult<(StatusCode, Json<UserCredentialModel>)> {
    let kind = payload.credential.kind();
    let outcome = credentials::award_credential(&state.db, payload).await?;
    inc_credential_awarded(kind, outcome.created);
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.credential)))
}

async fn list_credentials(
    State(state): State<AppState>,
    Query(query): Query<CredentialListQuery>,
) -> ApiResult<Json<Vec<UserCredentialModel>>> {
    Ok(Json(credentials::list_credentials(&state.db, &query).await?))
}

async fn get_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserCredentialModel>> {
    Ok(Json(credentials::get_credential(&state.db, id).await?))
}

async fn revoke_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserCredentialModel>> {
    let outcome = credentials::revoke_credential(&state.db, id).await?;
    if outcome.revoked {
        inc_credential_revoked();
    }
    Ok(Json(outcome.credential))
}

async fn list_attributes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<AttributeModel>>> {
    Ok(Json(credentials::list_attributes(&state.db, id).await?))
}

async fn set_attribute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttributeInput>,
) -> ApiResult<Json<AttributeModel>> {
    Ok(Json(credentials::set_attribute(&state.db, id, payload).await?))
}

// ============ 成绩分布 ============

#[derive(Debug, Deserialize)]
struct HistogramQuery {
    usage_key: String,
}

#[derive(Debug, Serialize)]
struct GradeBucket {
    grade: f64,
    count: i64,
}

async fn grade_histogram(
    State(state): State<AppState>,
    Query(query): Query<HistogramQuery>,
) -> ApiResult<Json<Vec<GradeBucket>>> {
    let usage_key: UsageKey = query
        .usage_key
        .parse()
        .map_err(|e| CredentialsError::bad_request(format!("{}", e)))?;
    let buckets = grades::grade_histogram(&state.db, &usage_key).await?;
    Ok(Json(
        buckets
            .into_iter()
            .map(|(grade, count)| GradeBucket { grade, count })
            .collect(),
    ))
}

async fn metrics() -> Response {
    render_metrics()
}
