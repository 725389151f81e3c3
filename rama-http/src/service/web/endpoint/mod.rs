use crate::{Body, IntoResponse, Request, Response, matcher::HttpMatcher};
use rama_core::{Context, Layer, Service, layer::MapResponseLayer, service::BoxService};
use std::future::Future;
use std::{convert::Infallible, fmt};

pub mod extract;

pub(crate) struct Endpoint<State> {
    pub(crate) matcher: HttpMatcher<State, Body>,
    pub(crate) service: BoxService<State, Request, Response, Infallible>,
}

/// utility trait to accept multiple types as an endpoint service for [`super::WebService`]
pub trait IntoEndpointService<State, T>: private::Sealed<T> {
    /// convert the type into a [`rama_core::Service`].
    fn into_endpoint_service(
        self,
    ) -> impl Service<State, Request, Response = Response, Error = Infallible>;
}

impl<State, S, R> IntoEndpointService<State, (State, R)> for S
where
    State: Clone + Send + Sync + 'static,
    S: Service<State, Request, Response = R, Error = Infallible>,
    R: IntoResponse + Send + Sync + 'static,
{
    fn into_endpoint_service(
        self,
    ) -> impl Service<State, Request, Response = Response, Error = Infallible> {
        MapResponseLayer::new(R::into_response).layer(self)
    }
}

impl<State, R> IntoEndpointService<State, ()> for R
where
    State: Clone + Send + Sync + 'static,
    R: IntoResponse + Clone + Send + Sync + 'static,
{
    fn into_endpoint_service(
        self,
    ) -> impl Service<State, Request, Response = Response, Error = Infallible> {
        StaticService(self)
    }
}

struct StaticService<R>(R);

impl<T> fmt::Debug for StaticService<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticService").field(&self.0).finish()
    }
}

impl<R> Clone for StaticService<R>
where
    R: Clone,
{
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<R, State> Service<State, Request> for StaticService<R>
where
    R: IntoResponse + Clone + Send + Sync + 'static,
    State: Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = Infallible;

    async fn serve(&self, _: Context<State>, _: Request) -> Result<Self::Response, Self::Error> {
        Ok(self.0.clone().into_response())
    }
}

mod service;
#[doc(inline)]
pub use service::EndpointServiceFn;

struct EndpointServiceFnWrapper<F, S, T> {
    inner: F,
    _marker: std::marker::PhantomData<fn(S, T) -> ()>,
}

impl<F: std::fmt::Debug, S, T> std::fmt::Debug for EndpointServiceFnWrapper<F, S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointServiceFnWrapper")
            .field("inner", &self.inner)
            .field(
                "_marker",
                &format_args!("{}", std::any::type_name::<fn(S, T) -> ()>()),
            )
            .finish()
    }
}

impl<F, S, T> Clone for EndpointServiceFnWrapper<F, S, T>
where
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<F, S, T> Service<S, Request> for EndpointServiceFnWrapper<F, S, T>
where
    F: EndpointServiceFn<S, T>,
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;

    async fn serve(&self, ctx: Context<S>, req: Request) -> Result<Self::Response, Self::Error> {
        Ok(self.inner.call(ctx, req).await)
    }
}

impl<F, S, T> IntoEndpointService<S, (F, S, T)> for F
where
    F: EndpointServiceFn<S, T>,
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    fn into_endpoint_service(
        self,
    ) -> impl Service<S, Request, Response = Response, Error = Infallible> {
        EndpointServiceFnWrapper {
            inner: self,
            _marker: std::marker::PhantomData,
        }
    }
}

mod private {
    use super::*;

    pub trait Sealed<T> {}

    impl<State, S, R> Sealed<(State, R)> for S
    where
        State: Clone + Send + Sync + 'static,
        S: Service<State, Request, Response = R, Error = Infallible>,
        R: IntoResponse + Send + Sync + 'static,
    {
    }

    impl<State, F, Fut, R> Sealed<(State, F, Context<State>, Fut, R)> for F
    where
        State: Clone + Send + Sync + 'static,
        F: Fn(Context<State>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + Sync + 'static,
    {
    }

    impl<State, F, Fut, R> Sealed<(State, F, Context<State>, Request, Fut, R)> for F
    where
        State: Clone + Send + Sync + 'static,
        F: Fn(Context<State>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + Sync + 'static,
    {
    }

    impl<R> Sealed<()> for R where R: IntoResponse + Send + Sync + 'static {}

    impl<F, S, T> Sealed<(F, S, T)> for F where F: EndpointServiceFn<S, T> {}
}
