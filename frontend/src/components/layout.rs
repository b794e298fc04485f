//! 受保护页面的外框：侧边栏 + 内容区

use leptos::prelude::*;
use leptos::task::spawn_local;
use schoolhub_shared::nav::nav_links;
use schoolhub_shared::protocol::UnreadCountRequest;

use crate::api::use_api;
use crate::components::icons::{GraduationCap, LogOut, Menu};
use crate::config::UNREAD_POLL_INTERVAL;
use crate::session::use_session;
use crate::theme::use_theme;
use crate::web::router::{Link, use_router};
use crate::web::timer::{Poller, bind_to_owner};

const CHAT_PATH: &str = "/chat";

#[component]
pub fn AppLayout(#[prop(into)] title: String, children: Children) -> impl IntoView {
    view! {
        <div class="drawer lg:drawer-open">
            <input id="app-drawer" type="checkbox" class="drawer-toggle" />
            <div class="drawer-content flex flex-col min-h-screen">
                <div class="navbar bg-base-100 shadow lg:hidden">
                    <label for="app-drawer" class="btn btn-ghost btn-square drawer-button">
                        <Menu attr:class="h-5 w-5" />
                    </label>
                    <span class="text-lg font-bold">{title.clone()}</span>
                </div>
                <main class="flex-1 p-4 md:p-8">
                    <h1 class="text-2xl font-bold mb-6 hidden lg:block">{title}</h1>
                    {children()}
                </main>
            </div>
            <div class="drawer-side z-40">
                <label for="app-drawer" aria-label="close sidebar" class="drawer-overlay"></label>
                <Sidebar />
            </div>
        </div>
    }
}

/// 侧边栏配色，随主题明暗切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SidebarPalette {
    surface: &'static str,
    profile: &'static str,
    muted: &'static str,
}

fn sidebar_palette(light: bool) -> SidebarPalette {
    if light {
        SidebarPalette {
            surface: "bg-gray-100 text-gray-900",
            profile: "bg-gray-200 hover:bg-gray-300",
            muted: "text-gray-600",
        }
    } else {
        SidebarPalette {
            surface: "bg-gray-900 text-white",
            profile: "bg-gray-800 hover:bg-gray-700",
            muted: "text-gray-400",
        }
    }
}

#[component]
fn Sidebar() -> impl IntoView {
    let session = use_session();
    let theme = use_theme();
    let palette = move || sidebar_palette(theme.is_light());
    let router = use_router();
    let api = use_api();
    let (unread, set_unread) = signal(0u32);

    let poller = Poller::start(UNREAD_POLL_INTERVAL, move || {
        let Some(token) = session.token_untracked() else {
            return;
        };
        let api = api.clone();
        spawn_local(async move {
            match api.call(&UnreadCountRequest, Some(&token)).await {
                Ok(count) => set_unread.set(count.count),
                Err(e) => log::debug!("unread count unavailable: {}", e),
            }
        });
    });
    bind_to_owner(poller);

    let links = move || {
        session
            .session
            .with(|s| s.role())
            .map(nav_links)
            .unwrap_or(&[])
    };
    let current = move || router.location().get();

    let on_logout = move |_| {
        spawn_local(session.sign_out());
    };

    view! {
        <aside class=move || format!("menu min-h-full w-72 p-4 flex flex-col gap-4 {}", palette().surface)>
            <div class="flex items-center gap-2 px-2">
                <div class="p-2 bg-primary/10 rounded-xl text-primary">
                    <GraduationCap attr:class="h-6 w-6" />
                </div>
                <span class="text-xl font-bold">"SchoolHub"</span>
            </div>

            {move || session.identity().map(|me| view! {
                <div class=format!("flex items-center gap-3 p-3 rounded-box {}", palette().profile)>
                    <div class="avatar placeholder">
                        <div class="bg-neutral text-neutral-content w-10 rounded-full">
                            <span>{me.initial()}</span>
                        </div>
                    </div>
                    <div class="min-w-0">
                        <p class="font-semibold truncate">{me.display_name().to_string()}</p>
                        <p class=format!("text-xs {}", palette().muted)>{me.role.as_str()}</p>
                    </div>
                </div>
            })}

            <ul class="flex-1">
                {move || links().iter().map(|link| {
                    let to = link.to;
                    let is_chat = to == CHAT_PATH;
                    let class = move || if current().starts_with(to) { "active" } else { "" };
                    view! {
                        <li>
                            <Link to=to class=class()>
                                <span class="flex-1">{link.label}</span>
                                <Show when=move || (is_chat && unread.get() > 0)>
                                    <span class="badge badge-primary badge-sm">{move || unread.get()}</span>
                                </Show>
                            </Link>
                        </li>
                    }
                }).collect_view()}
            </ul>

            <button class="btn btn-outline btn-error gap-2" on:click=on_logout>
                <LogOut attr:class="h-4 w-4" /> "Log out"
            </button>
        </aside>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_shared::theme::presets;

    #[test]
    fn palette_follows_theme_brightness() {
        let themes = presets();
        let light = themes.iter().find(|t| t.is_light()).unwrap();
        let dark = themes.iter().find(|t| !t.is_light()).unwrap();

        assert_eq!(sidebar_palette(light.is_light()).surface, "bg-gray-100 text-gray-900");
        assert_eq!(sidebar_palette(dark.is_light()).surface, "bg-gray-900 text-white");
        assert_ne!(sidebar_palette(true).muted, sidebar_palette(false).muted);
    }
}
