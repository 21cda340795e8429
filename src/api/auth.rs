use mongodb::{bson::doc, options::FindOptions, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{
                AuthResponse, AuthToken, LoginRequest, RefreshRequest, RegisterRequest, TokenKind,
                TokenPair, ValidateDniRequest,
            },
            candidate::RegionDesc,
            dni::ParseDniError,
            voter::VoterProfile,
            Dni, PersonRecord,
        },
        db::{Region, Voter, VoterCore},
        mongodb::{id_filter, is_duplicate_key_error, Coll, Counter},
        registry::Registry,
    },
    Config,
};

use super::common::{voter_by_token, voter_region};

pub fn routes() -> Vec<Route> {
    routes![list_regions, validate_dni, register, login, refresh, profile]
}

#[get("/regions")]
async fn list_regions(regions: Coll<Region>) -> Result<Json<Vec<RegionDesc>>> {
    let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
    let regions: Vec<Region> = regions.find(None, options).await?.try_collect().await?;
    Ok(Json(regions.into_iter().map(Into::into).collect()))
}

#[post("/voters/validate-dni", data = "<request>", format = "json")]
async fn validate_dni(
    request: Json<ValidateDniRequest>,
    registry: &State<Registry>,
) -> Result<Json<PersonRecord>> {
    let dni = parse_dni(&request.dni)?;
    let person = registry.lookup(&dni).await?;
    Ok(Json(person))
}

#[post("/voters/register", data = "<request>", format = "json")]
async fn register(
    request: Json<RegisterRequest>,
    voters: Coll<Voter>,
    regions: Coll<Region>,
    counters: Coll<Counter>,
    registry: &State<Registry>,
    config: &State<Config>,
    db_client: &State<Client>,
) -> Result<Json<AuthResponse>> {
    let dni = parse_dni(&request.dni)?;
    if request.credential.len() < config.min_credential_length() {
        return Err(Error::validation(format!(
            "Credential must be at least {} characters",
            config.min_credential_length()
        )));
    }

    // Friendly pre-checks; the unique index on `dni` remains the authority
    // under concurrent registrations.
    let existing = voters.find_one(doc! { "dni": dni.as_str() }, None).await?;
    if existing.is_some() {
        return Err(Error::conflict(format!("DNI {dni} is already registered")));
    }
    let region = regions
        .find_one(id_filter(request.region_id), None)
        .await?
        .ok_or_else(|| {
            Error::validation(format!("Region {} does not exist", request.region_id))
        })?;

    // The identity lookup is blocking I/O with its own timeout; it happens
    // strictly before the storage transaction opens.
    let person = registry.lookup(&dni).await?;

    let id = Counter::next_id::<Voter>(&counters).await?;
    let voter = Voter {
        id,
        voter: VoterCore::new(person, region.id, &request.credential),
    };

    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;
    match voters
        .insert_one_with_session(&voter, None, &mut session)
        .await
    {
        Ok(_) => session.commit_transaction().await?,
        Err(err) if is_duplicate_key_error(&err) => {
            session.abort_transaction().await?;
            return Err(Error::conflict(format!("DNI {dni} is already registered")));
        }
        Err(err) => return Err(err.into()),
    }
    info!("Registered voter {} in region {}", voter.id, region.name);

    let tokens = TokenPair::issue(&voter, config);
    Ok(Json(AuthResponse {
        voter: VoterProfile::new(voter, region.into()),
        tokens,
    }))
}

#[post("/voters/login", data = "<request>", format = "json")]
async fn login(
    request: Json<LoginRequest>,
    voters: Coll<Voter>,
    regions: Coll<Region>,
    config: &State<Config>,
) -> Result<Json<AuthResponse>> {
    let voter = voters
        .find_one(doc! { "dni": &request.dni }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("No voter registered with DNI {}", request.dni)))?;
    if !voter.verify_credential(&request.credential) {
        return Err(Error::unauthorized("Incorrect credential"));
    }

    let region = voter_region(&voter, &regions).await?;
    let tokens = TokenPair::issue(&voter, config);
    Ok(Json(AuthResponse {
        voter: VoterProfile::new(voter, region.into()),
        tokens,
    }))
}

#[post("/voters/refresh", data = "<request>", format = "json")]
async fn refresh(
    request: Json<RefreshRequest>,
    voters: Coll<Voter>,
    config: &State<Config>,
) -> Result<Json<TokenPair>> {
    let token = AuthToken::decode(&request.refresh, config)
        .map_err(|_| Error::unauthorized("Invalid or expired refresh token"))?;
    if token.kind != TokenKind::Refresh {
        return Err(Error::unauthorized("Not a refresh token"));
    }
    let voter = voters
        .find_one(id_filter(token.voter_id), None)
        .await?
        .ok_or_else(|| Error::unauthorized("Token does not match a registered voter"))?;

    // Rotation: each exchange issues a fresh pair.
    Ok(Json(TokenPair::issue(&voter, config)))
}

#[get("/voters/profile")]
async fn profile(
    token: AuthToken,
    voters: Coll<Voter>,
    regions: Coll<Region>,
) -> Result<Json<VoterProfile>> {
    let voter = voter_by_token(&token, &voters).await?;
    let region = voter_region(&voter, &regions).await?;
    Ok(Json(VoterProfile::new(voter, region.into())))
}

fn parse_dni(raw: &str) -> Result<Dni> {
    raw.parse()
        .map_err(|err: ParseDniError| Error::validation(err.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::model::{common::Role, db::RegionCore};

    use super::*;

    #[backend_test]
    async fn register_creates_voter_and_tokens(client: Client, db: Database, voters: Coll<Voter>) {
        let lima = Region::insert(&db, RegionCore::lima()).await.unwrap();

        let response = register_voter(&client, &RegisterRequest::example(lima.id)).await;
        assert_eq!(response.voter.dni, Dni::example());
        assert_eq!(response.voter.region.id, lima.id);
        assert_eq!(response.voter.role, Role::Voter);
        // Names come from the identity registry, never the request.
        assert_eq!(response.voter.given_names, PersonRecord::example().given_names);

        // Check the voter is in the database with a hashed credential.
        let voter = voters
            .find_one(doc! { "dni": Dni::example().as_str() }, None)
            .await
            .unwrap()
            .unwrap();
        assert!(voter.verify_credential("secret123"));
        assert!(!voter.verify_credential("wrong"));

        // The issued access token must be usable immediately.
        let profile_response = client
            .get(uri!(profile))
            .header(bearer(&response.tokens.access))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, profile_response.status());
        let profile: VoterProfile =
            serde_json::from_str(&profile_response.into_string().await.unwrap()).unwrap();
        assert_eq!(profile, response.voter);
    }

    #[backend_test]
    async fn register_rejects_duplicate_dni(client: Client, db: Database, voters: Coll<Voter>) {
        let lima = Region::insert(&db, RegionCore::lima()).await.unwrap();

        register_voter(&client, &RegisterRequest::example(lima.id)).await;
        register_expect_status(&client, &RegisterRequest::example(lima.id), Status::Conflict).await;

        // No duplicate row was created.
        let count = voters
            .count_documents(doc! { "dni": Dni::example().as_str() }, None)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[backend_test]
    async fn register_validates_input(client: Client, db: Database, voters: Coll<Voter>) {
        let lima = Region::insert(&db, RegionCore::lima()).await.unwrap();

        // Malformed DNI.
        let mut request = RegisterRequest::example(lima.id);
        request.dni = "1234".to_string();
        register_expect_status(&client, &request, Status::BadRequest).await;

        // Unknown region.
        let request = RegisterRequest::example(lima.id + 99);
        register_expect_status(&client, &request, Status::BadRequest).await;

        // DNI unknown to the registry.
        let mut request = RegisterRequest::example(lima.id);
        request.dni = Dni::unknown().to_string();
        register_expect_status(&client, &request, Status::BadRequest).await;

        // Short credential.
        let mut request = RegisterRequest::example(lima.id);
        request.credential = "abc".to_string();
        register_expect_status(&client, &request, Status::BadRequest).await;

        // Nothing was created.
        let count = voters.count_documents(None, None).await.unwrap();
        assert_eq!(count, 0);
    }

    #[backend_test]
    async fn login_checks_credentials(client: Client, db: Database) {
        let lima = Region::insert(&db, RegionCore::lima()).await.unwrap();
        register_voter(&client, &RegisterRequest::example(lima.id)).await;

        // Correct credentials.
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&LoginRequest::example()).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        // Wrong credential.
        let mut request = LoginRequest::example();
        request.credential = "not-the-credential".to_string();
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&request).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Unknown DNI.
        let mut request = LoginRequest::example();
        request.dni = Dni::example2().to_string();
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&request).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn refresh_rotates_tokens(client: Client, db: Database) {
        let lima = Region::insert(&db, RegionCore::lima()).await.unwrap();
        let auth = register_voter(&client, &RegisterRequest::example(lima.id)).await;

        // Exchange the refresh token for a new pair.
        let response = client
            .post(uri!(refresh))
            .header(ContentType::JSON)
            .body(
                serde_json::to_string(&RefreshRequest {
                    refresh: auth.tokens.refresh.clone(),
                })
                .unwrap(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let rotated: TokenPair =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();

        // The new access token works.
        let response = client
            .get(uri!(profile))
            .header(bearer(&rotated.access))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        // An access token is not accepted as a refresh token.
        let response = client
            .post(uri!(refresh))
            .header(ContentType::JSON)
            .body(
                serde_json::to_string(&RefreshRequest {
                    refresh: auth.tokens.access.clone(),
                })
                .unwrap(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Nor is a refresh token accepted as an access token.
        let response = client
            .get(uri!(profile))
            .header(bearer(&auth.tokens.refresh))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn profile_requires_token(client: Client) {
        let response = client.get(uri!(profile)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn validate_dni_round_trip(client: Client) {
        // Well-formed, known DNI.
        let response = client
            .post(uri!(validate_dni))
            .header(ContentType::JSON)
            .body(
                serde_json::to_string(&ValidateDniRequest {
                    dni: Dni::example().to_string(),
                })
                .unwrap(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let person: PersonRecord =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(person.dni, Dni::example());

        // Malformed DNI.
        let response = client
            .post(uri!(validate_dni))
            .header(ContentType::JSON)
            .body(
                serde_json::to_string(&ValidateDniRequest {
                    dni: "46O27896".to_string(),
                })
                .unwrap(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        // Unknown DNI.
        let response = client
            .post(uri!(validate_dni))
            .header(ContentType::JSON)
            .body(
                serde_json::to_string(&ValidateDniRequest {
                    dni: Dni::unknown().to_string(),
                })
                .unwrap(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test]
    async fn regions_are_listed_by_name(client: Client, db: Database) {
        Region::insert(&db, RegionCore::lima()).await.unwrap();
        Region::insert(&db, RegionCore::cusco()).await.unwrap();

        let response = client.get(uri!(list_regions)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let regions: Vec<RegionDesc> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let names: Vec<_> = regions.iter().map(|region| region.name.as_str()).collect();
        assert_eq!(names, vec!["Cusco", "Lima"]);
    }

    /// Build a bearer-token header from an access token.
    pub(crate) fn bearer(access: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {access}"))
    }

    /// Register a voter through the API and return the response.
    pub(crate) async fn register_voter(client: &Client, request: &RegisterRequest) -> AuthResponse {
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(serde_json::to_string(request).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    pub(crate) async fn register_expect_status(
        client: &Client,
        request: &RegisterRequest,
        status: Status,
    ) {
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(serde_json::to_string(request).unwrap())
            .dispatch()
            .await;
        assert_eq!(status, response.status());
    }
}
