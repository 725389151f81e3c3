use rama_core::{Service, telemetry::tracing};
use rama_http_types::{
    HeaderValue, Request,
    header::{RAMA_ID_HEADER_VALUE, USER_AGENT},
};

#[derive(Debug, Clone)]
pub(crate) struct UserAgent<T> {
    inner: T,
    user_agent: HeaderValue,
}

impl<T> UserAgent<T> {
    pub(crate) fn new(inner: T, user_agent: Option<HeaderValue>) -> Self {
        let user_agent = user_agent
            .map(|value| {
                let mut buf = Vec::new();
                buf.extend(value.as_bytes());
                buf.push(b' ');
                buf.extend(RAMA_ID_HEADER_VALUE.as_bytes());
                HeaderValue::from_bytes(&buf).expect("user-agent should be valid")
            })
            .unwrap_or(RAMA_ID_HEADER_VALUE);

        Self { inner, user_agent }
    }
}

impl<T, ReqBody> Service<Request<ReqBody>> for UserAgent<T>
where
    T: Service<Request<ReqBody>>,
{
    type Output = T::Output;
    type Error = T::Error;

    fn serve(
        &self,
        mut req: Request<ReqBody>,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send + '_ {
        if let Ok(Some(user_agent)) = req
            .headers_mut()
            .try_insert(USER_AGENT, self.user_agent.clone())
        {
            // The User-Agent header has already been set on the request. Let's
            // append our user agent to the end.
            let mut buf = Vec::with_capacity(user_agent.len() + 1 + self.user_agent.len());
            buf.extend(user_agent.as_bytes());
            buf.push(b' ');
            buf.extend(self.user_agent.as_bytes());

            match HeaderValue::from_bytes(&buf) {
                Ok(value) => req.headers_mut().insert(USER_AGENT, value),
                Err(err) => tracing::debug!("failed to create new rama-grpc user agent: {err}"),
            }
        }

        self.inner.serve(req)
    }
}
