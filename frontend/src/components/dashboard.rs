use leptos::prelude::*;
use schoolhub_shared::nav::nav_links;

use crate::components::icons::Sparkles;
use crate::components::layout::AppLayout;
use crate::session::use_session;
use crate::web::router::Link;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let session = use_session();

    let greeting = move || {
        session
            .identity()
            .map(|me| format!("Welcome back, {}!", me.display_name()))
            .unwrap_or_else(|| "Welcome!".to_string())
    };
    let role = move || session.session.with(|s| s.role());

    view! {
        <AppLayout title="Dashboard">
            <div class="hero bg-base-100 rounded-box shadow mb-8">
                <div class="hero-content w-full justify-start py-10">
                    <div class="p-3 bg-primary/10 rounded-2xl text-primary">
                        <Sparkles attr:class="h-8 w-8" />
                    </div>
                    <div>
                        <h2 class="text-2xl md:text-3xl font-bold">{greeting}</h2>
                        <p class="opacity-70">
                            {move || role().map(|r| format!("Signed in as {}", r)).unwrap_or_default()}
                        </p>
                    </div>
                </div>
            </div>

            <div class="grid grid-cols-1 sm:grid-cols-2 xl:grid-cols-3 gap-6">
                {move || {
                    role()
                        .map(nav_links)
                        .unwrap_or(&[])
                        .iter()
                        .map(|link| view! {
                            <Link to=link.to class="card bg-base-100 shadow hover:shadow-lg transition-shadow">
                                <div class="card-body">
                                    <h3 class="card-title">{link.label}</h3>
                                    <p class="text-sm opacity-60">{link.to}</p>
                                </div>
                            </Link>
                        })
                        .collect_view()
                }}
            </div>
        </AppLayout>
    }
}
