use crate::{
    extensions::{Extensions, ExtensionsMut},
    matcher::Matcher,
};

use super::{Policy, PolicyOutput, PolicyResult};

impl<M, P, Input> Policy<Input> for Vec<(M, P)>
where
    M: Matcher<Input>,
    P: Policy<Input>,
    Input: Send + ExtensionsMut + 'static,
{
    type Guard = Option<P::Guard>;
    type Error = P::Error;

    async fn check(&self, mut input: Input) -> PolicyResult<Input, Self::Guard, Self::Error> {
        for (matcher, policy) in self.iter() {
            let mut ext = Extensions::new();
            if matcher.matches(Some(&mut ext), &input) {
                input.extensions_mut().extend(ext);
                let result = policy.check(input).await;
                return match result.output {
                    PolicyOutput::Ready(guard) => {
                        let guard = Some(guard);
                        PolicyResult {
                            input: result.input,
                            output: PolicyOutput::Ready(guard),
                        }
                    }
                    PolicyOutput::Abort(err) => PolicyResult {
                        input: result.input,
                        output: PolicyOutput::Abort(err),
                    },
                    PolicyOutput::Retry => PolicyResult {
                        input: result.input,
                        output: PolicyOutput::Retry,
                    },
                };
            }
        }
        PolicyResult {
            input,
            output: PolicyOutput::Ready(None),
        }
    }
}

impl<M, P, Input> Policy<Input> for (Vec<(M, P)>, P)
where
    M: Matcher<Input>,
    P: Policy<Input>,
    Input: Send + ExtensionsMut + 'static,
{
    type Guard = P::Guard;
    type Error = P::Error;

    async fn check(&self, mut input: Input) -> PolicyResult<Input, Self::Guard, Self::Error> {
        let (matchers, default_policy) = self;
        for (matcher, policy) in matchers.iter() {
            let mut ext = Extensions::new();
            if matcher.matches(Some(&mut ext), &input) {
                input.extensions_mut().extend(ext);
                return policy.check(input).await;
            }
        }
        default_policy.check(input).await
    }
}
